//! Choosing the subpictures to draw at a display date.
//!
//! Only ready slots are inspected, so no heap lock is taken: a slot that is
//! destroyed concurrently may still be picked for one more frame. A slot
//! recycled by a producer while it is being inspected is left alone.
//!
//! Ephemeral subpictures (menu highlights and the like) replace each other:
//! among the eligible ones only the latest started survives, and it is itself
//! dropped once every timed subpicture on screen started after it.

use crate::pool::SubpicturePool;
use crate::subpicture::{SubpictureId, SubpictureKind, SubpictureStatus};
use tracing::{debug, trace};

impl SubpicturePool {
    /// Build the render list for `display_date`.
    ///
    /// Expired subpictures and superseded ephemeral ones are destroyed as a
    /// side effect. The surviving ephemeral subpicture, if any, comes first;
    /// the others follow in reverse slot order.
    pub fn select_for_display(&self, display_date: i64) -> Vec<SubpictureId> {
        let mut list = Vec::new();
        let mut ephemeral: Option<(SubpictureId, i64)> = None;
        let mut superseded = Vec::new();
        let mut cutoff: Option<i64> = None;

        for (index, slot) in self.slots.iter().enumerate() {
            if slot.status.load() != SubpictureStatus::Ready {
                continue;
            }
            let id = SubpictureId(index);

            let spu = slot.spu.read();
            // A producer recycles a slot only under its write guard.
            if slot.status.load() != SubpictureStatus::Ready {
                continue;
            }

            if spu.kind != SubpictureKind::Rle {
                list.push(id);
                continue;
            }

            if display_date > spu.stop {
                debug!(id = %id, stop = spu.stop, display_date, "Subpicture expired");
                slot.retire();
                continue;
            }

            if !spu.is_visible_at(display_date) {
                continue;
            }

            if spu.ephemeral {
                match ephemeral {
                    Some((current, current_start)) if spu.start > current_start => {
                        superseded.push((current, current_start));
                        ephemeral = Some((id, spu.start));
                    }
                    Some(_) => superseded.push((id, spu.start)),
                    None => ephemeral = Some((id, spu.start)),
                }
                continue;
            }

            list.push(id);
            cutoff = Some(cutoff.map_or(spu.start, |date| date.min(spu.start)));
        }

        for (id, start) in superseded {
            if self.retire_ephemeral(id, start) {
                debug!(id = %id, "Ephemeral subpicture superseded");
            }
        }

        list.reverse();

        if let Some((id, start)) = ephemeral {
            if cutoff.is_some_and(|date| start < date) {
                if self.retire_ephemeral(id, start) {
                    debug!(id = %id, start, "Ephemeral subpicture has lived too long");
                }
            } else {
                list.insert(0, id);
            }
        }

        trace!(display_date, count = list.len(), "Selected subpictures");
        list
    }

    /// Destroy the ephemeral subpicture seen in slot `id`, unless the slot
    /// has been recycled since.
    fn retire_ephemeral(&self, id: SubpictureId, start: i64) -> bool {
        let slot = &self.slots[id.0];
        let spu = slot.spu.read();
        let unchanged = slot.status.load() == SubpictureStatus::Ready
            && spu.ephemeral
            && spu.start == start;
        if unchanged {
            slot.retire();
        }
        unchanged
    }
}
