//! Subpicture units and their lifecycle status.
//!
//! A subpicture is a slot of the heap: a status tag that the display thread
//! may read at any time, and a payload with its placement and validity window
//! that belongs to whichever side the status says owns it.

use crate::rle::RleReader;
use aligned_vec::{AVec, ConstAlign};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Alignment of subpicture payloads, suitable for vector loads.
pub const PAYLOAD_ALIGN: usize = 16;

/// Payload storage of a subpicture.
pub type Payload = AVec<u8, ConstAlign<PAYLOAD_ALIGN>>;

pub(crate) fn empty_payload() -> Payload {
    AVec::new(PAYLOAD_ALIGN)
}

/// Lifecycle status of a heap slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SubpictureStatus {
    /// Never used, or reset after a failed allocation.
    Free = 0,
    /// Owned by a producer that is filling it.
    Reserved = 1,
    /// Visible to the display thread.
    Ready = 2,
    /// Released, storage kept for recycling.
    Destroyed = 3,
}

impl SubpictureStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Reserved,
            2 => Self::Ready,
            3 => Self::Destroyed,
            _ => Self::Free,
        }
    }
}

impl fmt::Display for SubpictureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Reserved => write!(f, "reserved"),
            Self::Ready => write!(f, "ready"),
            Self::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// Status tag shared between producers and the display thread.
///
/// Stores use release ordering so that a slot published as `Ready` carries
/// the payload written before it; loads use acquire ordering.
#[derive(Debug)]
pub(crate) struct AtomicStatus(AtomicU8);

impl AtomicStatus {
    pub(crate) fn new(status: SubpictureStatus) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    pub(crate) fn load(&self) -> SubpictureStatus {
        SubpictureStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, status: SubpictureStatus) {
        self.0.store(status as u8, Ordering::Release);
    }
}

/// How the payload of a subpicture is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubpictureKind {
    /// No payload.
    #[default]
    Empty,
    /// Zero-terminated text line.
    Text,
    /// Run-length encoded DVD subpicture unit.
    Rle,
}

impl fmt::Display for SubpictureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Text => write!(f, "text"),
            Self::Rle => write!(f, "rle"),
        }
    }
}

/// Handle to a slot of a [`SubpicturePool`](crate::SubpicturePool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubpictureId(pub(crate) usize);

impl SubpictureId {
    /// Slot index inside the heap.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SubpictureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload, placement and validity window of a subpicture.
pub struct Subpicture {
    pub(crate) kind: SubpictureKind,
    /// Requested payload size; the buffer may be one byte longer for text.
    pub(crate) size: usize,
    pub(crate) data: Payload,
    /// Horizontal position in render coordinates.
    pub x: u32,
    /// Vertical position in render coordinates.
    pub y: u32,
    /// Width in render pixels.
    pub width: u32,
    /// Height in render pixels.
    pub height: u32,
    /// First display date, in microseconds of media time.
    pub start: i64,
    /// Last display date, in microseconds of media time.
    pub stop: i64,
    /// Superseded as soon as a newer ephemeral subpicture is eligible.
    pub ephemeral: bool,
}

impl Subpicture {
    pub(crate) fn empty() -> Self {
        Self {
            kind: SubpictureKind::Empty,
            size: 0,
            data: empty_payload(),
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            start: 0,
            stop: 0,
            ephemeral: false,
        }
    }

    /// Get the payload kind.
    pub fn kind(&self) -> SubpictureKind {
        self.kind
    }

    /// Get the payload size this slot was allocated for.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the payload bytes for filling.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Set position and extent in render coordinates.
    pub fn set_geometry(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
    }

    /// Set the validity window.
    pub fn set_timing(&mut self, start: i64, stop: i64) {
        self.start = start;
        self.stop = stop;
    }

    /// Check whether `date` falls inside `[start, stop]`.
    pub fn is_visible_at(&self, date: i64) -> bool {
        self.start <= date && date <= self.stop
    }

    /// Iterate over the RLE codewords of the payload.
    pub fn codewords(&self) -> RleReader<'_> {
        RleReader::new(&self.data)
    }

    pub(crate) fn reset_placement(&mut self) {
        self.set_geometry(0, 0, 0, 0);
        self.set_timing(0, 0);
        self.ephemeral = false;
    }

    pub(crate) fn release_payload(&mut self) {
        self.data = empty_payload();
        self.size = 0;
    }
}

impl fmt::Debug for Subpicture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subpicture")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("start", &self.start)
            .field("stop", &self.stop)
            .field("ephemeral", &self.ephemeral)
            .finish()
    }
}
