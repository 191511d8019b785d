//! # transcode-spu
//!
//! Subpicture management for the video output: a fixed-size heap of
//! subpicture units filled by decoder threads, the per-frame selection of the
//! units to show at a display date, and the compositor drawing their
//! run-length encoded bitmaps onto output pictures.
//!
//! ## Quick Start
//!
//! ```rust
//! use transcode_spu::{
//!     Chroma, Picture, RenderSize, RleWriter, SpuConfig, SpuRenderer, SubpictureKind,
//!     SubpicturePool,
//! };
//!
//! let pool = SubpicturePool::new(SpuConfig::default().with_margin(16)).unwrap();
//!
//! // Producer side: reserve, fill, publish.
//! let mut rle = RleWriter::new();
//! rle.push(64, 2).push(64, 3);
//!
//! let id = pool.create(SubpictureKind::Rle, rle.len()).unwrap();
//! {
//!     let mut spu = pool.write(id).unwrap();
//!     spu.data_mut().copy_from_slice(rle.as_bytes());
//!     spu.set_geometry(32, 0, 64, 2);
//!     spu.set_timing(0, 2_000_000);
//! }
//! pool.display(id, 576).unwrap();
//!
//! // Display side, once per frame.
//! let mut picture = Picture::new(720, 576, Chroma::I420);
//! let list = pool.select_for_display(40_000);
//! SpuRenderer::from_config(pool.config()).render(
//!     &mut picture,
//!     &pool,
//!     &list,
//!     RenderSize::new(720, 576),
//! );
//! assert_eq!(list, vec![id]);
//! ```

pub mod config;
pub mod error;
pub mod picture;
pub mod placement;
pub mod pool;
pub mod render;
pub mod rle;
mod select;
pub mod subpicture;

pub use config::{SpuConfig, SpuPalette};
pub use error::{Result, SpuError};
pub use picture::{Chroma, Picture, Plane};
pub use placement::apply_margin;
pub use pool::{SharedSubpicturePool, SubpicturePool};
pub use render::{scale_factor, scaled_run, RenderSize, SpuRenderer};
pub use rle::{Codeword, RleReader, RleWriter};
pub use subpicture::{Subpicture, SubpictureId, SubpictureKind, SubpictureStatus};
