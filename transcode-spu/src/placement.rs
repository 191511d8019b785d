//! Final placement of subpictures on the output.

use crate::subpicture::Subpicture;

/// Margin value that leaves the producer's placement untouched.
pub const MARGIN_DISABLED: i32 = -1;

/// Force a subpicture `margin` pixels above the bottom edge.
///
/// A negative margin, or a subpicture that would not fit above the margin,
/// keeps the position chosen by the producer. Returns whether `y` was moved.
pub fn apply_margin(spu: &mut Subpicture, output_height: u32, margin: i32) -> bool {
    let Ok(margin) = u32::try_from(margin) else {
        return false;
    };

    match spu.height.checked_add(margin) {
        Some(needed) if needed <= output_height => {
            spu.y = output_height - margin - spu.height;
            true
        }
        _ => false,
    }
}
