//! Output picture buffers that subpictures are drawn onto.

use std::fmt;

/// Chroma (pixel layout) of an output picture, named by its FourCC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Chroma {
    /// Planar YUV 4:2:0, Y then U then V.
    I420,
    /// Same layout as I420.
    Iyuv,
    /// Planar YUV 4:2:0, Y then V then U.
    Yv12,
    /// Packed RGB 5:5:5, 16bpp.
    Rv15,
    /// Packed RGB 5:6:5, 16bpp.
    Rv16,
    /// Packed RGB, 24bpp.
    Rv24,
    /// Packed RGB, 32bpp.
    Rv32,
    /// Packed YUV 4:2:2, Y0 U Y1 V.
    Yuy2,
}

impl Chroma {
    /// Get the FourCC code.
    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            Self::I420 => *b"I420",
            Self::Iyuv => *b"IYUV",
            Self::Yv12 => *b"YV12",
            Self::Rv15 => *b"RV15",
            Self::Rv16 => *b"RV16",
            Self::Rv24 => *b"RV24",
            Self::Rv32 => *b"RV32",
            Self::Yuy2 => *b"YUY2",
        }
    }

    /// Look a chroma up by FourCC.
    pub fn from_fourcc(fourcc: [u8; 4]) -> Option<Self> {
        match &fourcc {
            b"I420" => Some(Self::I420),
            b"IYUV" => Some(Self::Iyuv),
            b"YV12" => Some(Self::Yv12),
            b"RV15" => Some(Self::Rv15),
            b"RV16" => Some(Self::Rv16),
            b"RV24" => Some(Self::Rv24),
            b"RV32" => Some(Self::Rv32),
            b"YUY2" => Some(Self::Yuy2),
            _ => None,
        }
    }

    /// Get the number of planes.
    pub fn num_planes(&self) -> usize {
        match self {
            Self::I420 | Self::Iyuv | Self::Yv12 => 3,
            _ => 1,
        }
    }

    /// Get the bytes per pixel of the first plane.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::I420 | Self::Iyuv | Self::Yv12 => 1,
            Self::Rv15 | Self::Rv16 | Self::Yuy2 => 2,
            Self::Rv24 => 3,
            Self::Rv32 => 4,
        }
    }

    /// Check if this is a planar 4:2:0 chroma.
    pub fn is_planar_420(&self) -> bool {
        matches!(self, Self::I420 | Self::Iyuv | Self::Yv12)
    }
}

impl fmt::Display for Chroma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fourcc = self.fourcc();
        write!(f, "{}", String::from_utf8_lossy(&fourcc))
    }
}

/// A plane of pixel rows.
#[derive(Clone)]
pub struct Plane {
    data: Vec<u8>,
    pitch: usize,
}

impl Plane {
    /// Get the pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the pixel bytes for writing.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the number of bytes between two rows.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Get one row.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let start = y.checked_mul(self.pitch)?;
        self.data.get(start..start + self.pitch)
    }
}

/// A decoded picture in output coordinates.
#[derive(Clone)]
pub struct Picture {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub chroma: Chroma,
    planes: Vec<Plane>,
}

impl Picture {
    /// Allocate a zeroed picture.
    pub fn new(width: u32, height: u32, chroma: Chroma) -> Self {
        let planes = (0..chroma.num_planes())
            .map(|plane| {
                let (plane_width, plane_height) = if plane == 0 {
                    (width as usize, height as usize)
                } else {
                    (width as usize / 2, height as usize / 2)
                };

                // Align pitch to 32 bytes for SIMD optimization
                let pitch = (plane_width * chroma.bytes_per_pixel() + 31) & !31;
                Plane {
                    data: vec![0u8; pitch * plane_height],
                    pitch,
                }
            })
            .collect();

        Self {
            width,
            height,
            chroma,
            planes,
        }
    }

    /// Get the number of planes.
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    /// Get a plane.
    pub fn plane(&self, index: usize) -> Option<&Plane> {
        self.planes.get(index)
    }

    /// Get a plane for writing.
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut Plane> {
        self.planes.get_mut(index)
    }
}

impl fmt::Debug for Picture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Picture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("chroma", &self.chroma)
            .field("planes", &self.planes.len())
            .finish()
    }
}
