//! Subpicture heap and renderer configuration.

use crate::error::{Result, SpuError};
use crate::placement::MARGIN_DISABLED;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`SpuConfig::margin`].
pub const MARGIN_ENV: &str = "TRANSCODE_SPU_MARGIN";

/// Default number of heap slots.
pub const DEFAULT_CAPACITY: usize = 8;

/// Default upper bound on a single payload allocation.
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Colour lookup tables used to draw RLE subpictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpuPalette {
    /// Luma values for planar YUV output.
    pub clut8: [u8; 4],
    /// Pixel values for 16-bit packed RGB output.
    pub clut16: [u16; 4],
    /// Alpha per colour class: 0x00 transparent, 0xff opaque.
    pub alpha: [u8; 4],
}

impl Default for SpuPalette {
    fn default() -> Self {
        Self {
            clut8: [0xaa, 0x44, 0xff, 0x88],
            clut16: [0xaaaa, 0x4444, 0xffff, 0x8888],
            alpha: [0x00, 0xff, 0xff, 0xff],
        }
    }
}

/// Subpicture configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpuConfig {
    /// Number of heap slots.
    pub capacity: usize,
    /// Distance from the bottom edge in output pixels; negative disables it.
    pub margin: i32,
    /// Largest payload a producer may request, in bytes.
    pub max_payload_size: usize,
    /// Colour tables for the compositor.
    pub palette: SpuPalette,
}

impl Default for SpuConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            margin: MARGIN_DISABLED,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            palette: SpuPalette::default(),
        }
    }
}

impl SpuConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with the margin taken from `TRANSCODE_SPU_MARGIN`.
    ///
    /// An unset or unparsable variable keeps the default margin.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(MARGIN_ENV) {
            match value.trim().parse::<i32>() {
                Ok(margin) => config.margin = margin,
                Err(e) => {
                    tracing::warn!(value = %value, error = %e, "Ignoring invalid {}", MARGIN_ENV);
                }
            }
        }
        config
    }

    /// Set the number of heap slots.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the bottom margin.
    pub fn with_margin(mut self, margin: i32) -> Self {
        self.margin = margin;
        self
    }

    /// Set the payload size limit.
    pub fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    /// Set the colour tables.
    pub fn with_palette(mut self, palette: SpuPalette) -> Self {
        self.palette = palette;
        self
    }

    /// Check the configuration for values the heap cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(SpuError::Config("capacity must be at least 1".into()));
        }
        Ok(())
    }
}
