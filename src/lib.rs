/*!
# sqz-rs

`sqz-rs` is a pure Rust implementation of SQZ, a byte-scalable
progressive image codec. A single encode produces a bitstream such
that any prefix of it decodes to a valid, progressively better
reconstruction of the same image; at full budget the reversible color
modes are mathematically lossless.

## Pipeline

- Reversible color transform (Grayscale, YCoCg-R) or lossy perceptual
  transform (Oklab, logl1) into 16-bit coefficient planes.
- Reversible 5/3 integer wavelet, 1 to 8 levels.
- Sign-magnitude bitplane coding with WDR run-coded significance over
  a configurable spatial scan order (raster, snake, Morton, Hilbert).
- A static cross-subband schedule orders bitplanes by subjective
  importance; the byte budget is the only termination condition.

## Determinism

There is no floating point anywhere, including the color lookup
tables, which are built in const context from integer arithmetic.
Encoding the same input twice produces byte-identical output on every
platform.

## Safety

Pure Rust, no `unsafe` outside the optional `ffi` surface.
*/

pub mod arena;
pub mod bit_io;
pub mod coder;
pub mod color;
pub mod constants;
pub mod decoder;
pub mod dwt;
pub mod encoder;
pub mod error;
pub mod header;
pub mod plane;
pub mod scan;
pub mod schedule;
pub mod subband;

#[cfg(feature = "ffi")]
pub mod ffi;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use decoder::SqzDecoder;
pub use encoder::SqzEncoder;
pub use error::SqzError;

use num_enum::TryFromPrimitive;

/// Color mode, in header encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ColorMode {
    /// Single plane, `Y = p - 128`. Reversible.
    Grayscale = 0,
    /// Reversible lifted YCoCg.
    YCoCgR = 1,
    /// 12-bit fixed-point Oklab. Lossy.
    Oklab = 2,
    /// Log-companded L1 luminance with opponent chroma. Lossy.
    Logl1 = 3,
}

/// Spatial scan order used to seed each subband's LIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ScanOrder {
    Raster = 0,
    Snake = 1,
    Morton = 2,
    Hilbert = 3,
}

/// Everything the codec needs to know about an image besides its
/// pixels. Serialized as the 6-byte stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqzDescriptor {
    /// Width in pixels (8..=65535).
    pub width: u32,
    /// Height in pixels (8..=65535).
    pub height: u32,
    pub color_mode: ColorMode,
    /// Wavelet decomposition levels (1..=8); the encoder clamps this
    /// to what the dimensions support.
    pub dwt_levels: u8,
    pub scan_order: ScanOrder,
    /// Delays chroma by one extra schedule round.
    pub subsampling: bool,
}

impl SqzDescriptor {
    /// Number of coefficient planes (1 for grayscale, 3 otherwise).
    pub fn plane_count(&self) -> usize {
        color::plane_count(self.color_mode)
    }

    /// Size in bytes of the packed pixel buffer this descriptor
    /// describes.
    pub fn pixel_buffer_size(&self) -> usize {
        self.width as usize * self.height as usize * color::bytes_per_pixel(self.color_mode)
    }
}
