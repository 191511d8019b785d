//! Drawing RLE subpictures onto output pictures.
//!
//! The RLE payload has already been checked by the decoder, so this code
//! does not validate it: a short stream stops drawing, and writes are clipped
//! to the destination plane.
//!
//! Planar 4:2:0 outputs are drawn at the subpicture's native resolution into
//! the luma plane. RV16 outputs are scaled from the render size to the output
//! size with 6-bit fixed-point factors.

use crate::config::{SpuConfig, SpuPalette};
use crate::error::{Result, SpuError};
use crate::picture::{Chroma, Picture};
use crate::pool::SubpicturePool;
use crate::subpicture::{Subpicture, SubpictureId, SubpictureKind, SubpictureStatus};
use tracing::{debug, warn};

/// Fractional bits of the scale factors.
pub const SCALE_SHIFT: u32 = 6;

/// Fixed-point ratio `output / render`, or `None` for an empty render size.
pub fn scale_factor(output: u32, render: u32) -> Option<u32> {
    if render == 0 {
        return None;
    }
    u32::try_from((u64::from(output) << SCALE_SHIFT) / u64::from(render)).ok()
}

/// Whole output pixels covered by a run of `run` source pixels.
///
/// Drawing fills one more pixel than this so that rounding never leaves gaps.
pub fn scaled_run(run: u16, scale: u32) -> usize {
    ((u64::from(run) * u64::from(scale)) >> SCALE_SHIFT) as usize
}

/// Size of the coordinate space subpictures are positioned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSize {
    /// Width in render pixels.
    pub width: u32,
    /// Height in render pixels.
    pub height: u32,
}

impl RenderSize {
    /// Create a render size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Draws selected subpictures onto pictures.
#[derive(Debug, Clone, Default)]
pub struct SpuRenderer {
    palette: SpuPalette,
}

impl SpuRenderer {
    /// Create a renderer with the given colour tables.
    pub fn new(palette: SpuPalette) -> Self {
        Self { palette }
    }

    /// Create a renderer from a configuration.
    pub fn from_config(config: &SpuConfig) -> Self {
        Self::new(config.palette)
    }

    /// Get the colour tables.
    pub fn palette(&self) -> &SpuPalette {
        &self.palette
    }

    /// Draw every subpicture of `list` in order.
    ///
    /// A subpicture that cannot be drawn is reported and skipped.
    pub fn render(
        &self,
        picture: &mut Picture,
        pool: &SubpicturePool,
        list: &[SubpictureId],
        render: RenderSize,
    ) {
        for &id in list {
            let Some(spu) = pool.read(id) else {
                warn!(id = %id, "Subpicture does not exist");
                continue;
            };
            if pool.status(id) != Some(SubpictureStatus::Ready) {
                debug!(id = %id, "Subpicture is no longer ready");
                continue;
            }

            if let Err(e) = self.render_subpicture(picture, &spu, render) {
                warn!(id = %id, error = %e, "Cannot render subpicture");
            }
        }
    }

    /// Draw a single subpicture.
    pub fn render_subpicture(
        &self,
        picture: &mut Picture,
        spu: &Subpicture,
        render: RenderSize,
    ) -> Result<()> {
        match spu.kind() {
            SubpictureKind::Rle => self.render_rle(picture, spu, render),
            SubpictureKind::Text => {
                debug!("Text subpictures are not rendered");
                Ok(())
            }
            kind => Err(SpuError::UnknownKind(kind)),
        }
    }

    fn render_rle(&self, picture: &mut Picture, spu: &Subpicture, render: RenderSize) -> Result<()> {
        match picture.chroma {
            chroma if chroma.is_planar_420() => {
                self.draw_planar(picture, spu);
                Ok(())
            }
            Chroma::Rv16 => self.draw_rv16(picture, spu, render),
            chroma => Err(SpuError::UnsupportedChroma(chroma)),
        }
    }

    fn draw_planar(&self, picture: &mut Picture, spu: &Subpicture) {
        let Some(plane) = picture.plane_mut(0) else {
            return;
        };
        let pitch = plane.pitch();
        let data = plane.data_mut();

        let left = spu.x as usize;
        let width = spu.width as usize;
        let mut codes = spu.codewords();

        for row in 0..spu.height as usize {
            let line = (spu.y as usize + row) * pitch;

            let mut remaining = width;
            while remaining > 0 {
                let Some(code) = codes.next() else {
                    return;
                };
                let len = (code.run() as usize).min(remaining);
                let class = code.class();

                match self.palette.alpha[class] {
                    0x00 => {}
                    // TODO: blend partial alpha values instead of drawing them opaque.
                    _ => fill_bytes(
                        data,
                        line + left + width - remaining,
                        len,
                        self.palette.clut8[class],
                    ),
                }

                remaining -= len;
            }
        }
    }

    fn draw_rv16(&self, picture: &mut Picture, spu: &Subpicture, render: RenderSize) -> Result<()> {
        let invalid = SpuError::InvalidRenderSize {
            width: render.width,
            height: render.height,
        };
        let xscale = scale_factor(picture.width, render.width).ok_or_else(|| invalid.clone())? as usize;
        let yscale = scale_factor(picture.height, render.height).ok_or(invalid)? as usize;

        let Some(plane) = picture.plane_mut(0) else {
            return Ok(());
        };
        let pitch = plane.pitch();
        let data = plane.data_mut();

        // Fixed-point extent of the scaled subpicture.
        let width = spu.width as usize * xscale;
        let height = spu.height as usize * yscale;

        let right = (width >> SCALE_SHIFT) + ((spu.x as usize * xscale) >> SCALE_SHIFT);
        let top = (spu.y as usize * yscale) >> SCALE_SHIFT;

        let mut codes = spu.codewords();
        let mut y = 0;

        while y < height {
            let first = y >> SCALE_SHIFT;
            y += yscale;
            let last = (y >> SCALE_SHIFT).max(first + 1);

            let mut x = width;
            while x > 0 {
                let Some(code) = codes.next() else {
                    return Ok(());
                };
                let len = xscale * code.run() as usize;
                let class = code.class();

                match self.palette.alpha[class] {
                    0x00 => {}
                    _ => {
                        let column = right - (x >> SCALE_SHIFT);
                        let pixels = scaled_run(code.run(), xscale as u32) + 1;
                        for row in first..last {
                            fill_rv16(
                                data,
                                (top + row) * pitch + column * 2,
                                pixels,
                                self.palette.clut16[class],
                            );
                        }
                    }
                }

                x = x.saturating_sub(len);
            }
        }

        Ok(())
    }
}

fn fill_bytes(data: &mut [u8], offset: usize, len: usize, value: u8) {
    let end = offset.saturating_add(len).min(data.len());
    if let Some(dst) = data.get_mut(offset..end) {
        dst.fill(value);
    }
}

fn fill_rv16(data: &mut [u8], offset: usize, pixels: usize, value: u16) {
    let end = offset.saturating_add(pixels.saturating_mul(2)).min(data.len());
    if let Some(dst) = data.get_mut(offset..end) {
        let bytes = value.to_le_bytes();
        for pixel in dst.chunks_exact_mut(2) {
            pixel.copy_from_slice(&bytes);
        }
    }
}
