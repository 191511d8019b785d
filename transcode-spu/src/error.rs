//! Error types for subpicture management and rendering.

use crate::picture::Chroma;
use crate::subpicture::{SubpictureId, SubpictureKind, SubpictureStatus};
use thiserror::Error;

/// Errors raised by the subpicture heap and the compositor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpuError {
    /// Every slot is either reserved or displayed.
    #[error("subpicture heap is full")]
    PoolFull,

    /// The payload buffer for a subpicture could not be allocated.
    #[error("subpicture allocation of {size} bytes failed")]
    AllocationFailed { size: usize },

    /// A lifecycle operation found the slot in an unexpected state.
    #[error("subpicture {id} has invalid status {status}")]
    InvalidStatus {
        id: SubpictureId,
        status: SubpictureStatus,
    },

    /// The handle does not name a slot of this heap.
    #[error("subpicture {0} does not exist")]
    InvalidHandle(SubpictureId),

    /// The output chroma has no subpicture renderer.
    #[error("unknown chroma {0}, can't render subpicture")]
    UnsupportedChroma(Chroma),

    /// Scaling needs a non-empty render size.
    #[error("invalid render size {width}x{height}")]
    InvalidRenderSize { width: u32, height: u32 },

    /// The subpicture kind has no renderer.
    #[error("unknown subpicture kind {0}")]
    UnknownKind(SubpictureKind),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for subpicture operations.
pub type Result<T> = std::result::Result<T, SpuError>;

impl SpuError {
    /// Check if the caller can simply try again on a later frame.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SpuError::PoolFull | SpuError::AllocationFailed { .. } | SpuError::InvalidStatus { .. }
        )
    }
}
