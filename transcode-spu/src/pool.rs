//! Fixed-size subpicture heap.
//!
//! Producer threads reserve a slot with [`SubpicturePool::create`], fill its
//! payload through [`SubpicturePool::write`] and hand it to the display thread
//! with [`SubpicturePool::display`]. Destroyed slots keep their payload so that
//! a later request of the same kind and a smaller or equal size can reuse it
//! without allocating.

use crate::config::SpuConfig;
use crate::error::{Result, SpuError};
use crate::placement::apply_margin;
use crate::subpicture::{
    AtomicStatus, Payload, Subpicture, SubpictureId, SubpictureKind, SubpictureStatus,
    PAYLOAD_ALIGN,
};
use aligned_vec::AVec;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::alloc::Layout;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) struct Slot {
    pub(crate) status: AtomicStatus,
    pub(crate) spu: RwLock<Subpicture>,
}

impl Slot {
    fn new() -> Self {
        Self {
            status: AtomicStatus::new(SubpictureStatus::Free),
            spu: RwLock::new(Subpicture::empty()),
        }
    }

    pub(crate) fn retire(&self) {
        self.status.store(SubpictureStatus::Destroyed);
    }
}

/// A heap of subpicture slots shared by producers and the display thread.
pub struct SubpicturePool {
    pub(crate) slots: Box<[Slot]>,
    /// Serialises slot claiming and payload (re)allocation.
    lock: Mutex<()>,
    config: SpuConfig,
    /// Payload buffers allocated so far (for statistics).
    allocations: AtomicUsize,
}

/// A subpicture heap shared between threads.
pub type SharedSubpicturePool = Arc<SubpicturePool>;

impl SubpicturePool {
    /// Create a heap of `config.capacity` free slots.
    pub fn new(config: SpuConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create a heap with the default configuration and `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::new(SpuConfig::default().with_capacity(capacity))
    }

    fn build(config: SpuConfig) -> Self {
        let slots = (0..config.capacity).map(|_| Slot::new()).collect();
        Self {
            slots,
            lock: Mutex::new(()),
            config,
            allocations: AtomicUsize::new(0),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SpuConfig {
        &self.config
    }

    /// Get the number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Get the number of payload buffers allocated so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Iterate over the handles of every slot.
    pub fn ids(&self) -> impl Iterator<Item = SubpictureId> {
        (0..self.slots.len()).map(SubpictureId)
    }

    /// Get the status of a slot.
    pub fn status(&self, id: SubpictureId) -> Option<SubpictureStatus> {
        self.slots.get(id.0).map(|slot| slot.status.load())
    }

    /// Count the slots currently visible to the display thread.
    pub fn ready_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.status.load() == SubpictureStatus::Ready)
            .count()
    }

    /// Lock a subpicture for reading.
    pub fn read(&self, id: SubpictureId) -> Option<RwLockReadGuard<'_, Subpicture>> {
        self.slots.get(id.0).map(|slot| slot.spu.read())
    }

    /// Lock a subpicture for filling.
    ///
    /// Only the producer owning a reserved slot should write to it.
    pub fn write(&self, id: SubpictureId) -> Option<RwLockWriteGuard<'_, Subpicture>> {
        self.slots.get(id.0).map(|slot| slot.spu.write())
    }

    pub(crate) fn slot(&self, id: SubpictureId) -> Result<&Slot> {
        self.slots.get(id.0).ok_or(SpuError::InvalidHandle(id))
    }

    /// Reserve a subpicture with a payload of `size` bytes.
    ///
    /// A destroyed slot of the same kind and at least `size` bytes is reused
    /// as is. Otherwise the first free slot gets a fresh payload, or, when the
    /// heap has no free slot, the first destroyed one is recycled.
    pub fn create(&self, kind: SubpictureKind, size: usize) -> Result<SubpictureId> {
        let _guard = self.lock.lock();

        let mut free = None;
        let mut destroyed = None;

        for (index, slot) in self.slots.iter().enumerate() {
            match slot.status.load() {
                SubpictureStatus::Destroyed => {
                    let mut spu = slot.spu.write();
                    if kind != SubpictureKind::Empty && spu.kind == kind && spu.size >= size {
                        spu.reset_placement();
                        slot.status.store(SubpictureStatus::Reserved);
                        debug!(id = %SubpictureId(index), kind = %kind, size, "Reusing subpicture storage");
                        return Ok(SubpictureId(index));
                    }
                    if destroyed.is_none() {
                        destroyed = Some(index);
                    }
                }
                SubpictureStatus::Free if free.is_none() => free = Some(index),
                _ => {}
            }
        }

        let index = match (free, destroyed) {
            (Some(index), _) => index,
            (None, Some(index)) => {
                self.slots[index].spu.write().release_payload();
                index
            }
            (None, None) => {
                warn!(capacity = self.slots.len(), "Subpicture heap is full");
                return Err(SpuError::PoolFull);
            }
        };

        let id = SubpictureId(index);
        let slot = &self.slots[index];
        let mut spu = slot.spu.write();

        match self.allocate_payload(kind, size) {
            Ok(data) => {
                spu.data = data;
                spu.kind = kind;
                spu.size = size;
                spu.reset_placement();
                slot.status.store(SubpictureStatus::Reserved);
                self.allocations.fetch_add(1, Ordering::Relaxed);
                debug!(id = %id, kind = %kind, size, "Allocated subpicture");
                Ok(id)
            }
            Err(err) => {
                spu.release_payload();
                spu.kind = SubpictureKind::Empty;
                slot.status.store(SubpictureStatus::Free);
                warn!(id = %id, error = %err, "Subpicture allocation failed");
                Err(err)
            }
        }
    }

    fn allocate_payload(&self, kind: SubpictureKind, size: usize) -> Result<Payload> {
        let length = match kind {
            SubpictureKind::Text => size.checked_add(1),
            SubpictureKind::Rle => Some(size),
            SubpictureKind::Empty => None,
        };

        let length = length
            .filter(|_| size <= self.config.max_payload_size)
            .filter(|&n| Layout::from_size_align(n, PAYLOAD_ALIGN).is_ok())
            .ok_or(SpuError::AllocationFailed { size })?;

        let mut data = AVec::with_capacity(PAYLOAD_ALIGN, length);
        data.resize(length, 0);
        Ok(data)
    }

    /// Place a reserved subpicture and make it visible to the display thread.
    ///
    /// The configured margin is applied against `output_height`. A slot that
    /// is not reserved is reported but still published.
    pub fn display(&self, id: SubpictureId, output_height: u32) -> Result<()> {
        let slot = self.slot(id)?;

        let status = slot.status.load();
        if status != SubpictureStatus::Reserved {
            warn!(id = %id, status = %status, "Subpicture has invalid status");
        }

        {
            let mut spu = slot.spu.write();
            if apply_margin(&mut spu, output_height, self.config.margin) {
                debug!(id = %id, y = spu.y, margin = self.config.margin, "Forced subpicture position");
            }
        }

        slot.status.store(SubpictureStatus::Ready);
        Ok(())
    }

    /// Release a subpicture, keeping its storage for recycling.
    ///
    /// Needs no heap lock: the display thread ignores slots that are not
    /// ready, and the payload is left untouched.
    pub fn destroy(&self, id: SubpictureId) -> Result<()> {
        let slot = self.slot(id)?;

        let status = slot.status.load();
        if !matches!(
            status,
            SubpictureStatus::Reserved | SubpictureStatus::Ready
        ) {
            warn!(id = %id, status = %status, "Subpicture has invalid status");
        }

        slot.retire();
        Ok(())
    }
}

impl Default for SubpicturePool {
    fn default() -> Self {
        Self::build(SpuConfig::default())
    }
}

impl std::fmt::Debug for SubpicturePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubpicturePool")
            .field("capacity", &self.slots.len())
            .field("ready", &self.ready_count())
            .field("allocations", &self.allocations())
            .finish()
    }
}
