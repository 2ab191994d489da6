//! The 6-byte stream header: pack, unpack, validate.
//!
//! All fields are bit-packed MSB-first. A stream whose magic byte is
//! wrong (or that ends inside the header) is `InvalidParameter`; a
//! header that parses but violates the dimension or level bounds is
//! `DataCorrupted`.

use crate::bit_io::{BitReader, BitWriter, Eob};
use crate::constants::{
    MAGIC, MAXIMUM_DIMENSION, MAXIMUM_DWT_LEVELS, MINIMUM_DIMENSION, MINIMUM_DWT_LEVELS,
};
use crate::error::SqzError;
use crate::{ColorMode, ScanOrder, SqzDescriptor};

/// Largest level count usable for the given dimensions. The floor-log
/// bound keeps every transformed region at least 8 samples in each
/// dimension; the lower clamp keeps the 8-pixel minimum image
/// encodable with one level.
pub fn max_levels(width: u32, height: u32) -> u8 {
    let shortest = width.min(height).max(1);
    let log = 31 - shortest.leading_zeros();
    (log.saturating_sub(3).max(1) as u8).min(MAXIMUM_DWT_LEVELS)
}

/// Encode-side descriptor validation. Dimensions must be in range;
/// the level count is clamped rather than rejected, and subsampling is
/// normalized off for grayscale.
pub fn validate_and_clamp(descriptor: &mut SqzDescriptor) -> Result<(), SqzError> {
    if descriptor.width < MINIMUM_DIMENSION
        || descriptor.width > MAXIMUM_DIMENSION
        || descriptor.height < MINIMUM_DIMENSION
        || descriptor.height > MAXIMUM_DIMENSION
    {
        return Err(SqzError::InvalidParameter);
    }
    let ceiling = max_levels(descriptor.width, descriptor.height);
    descriptor.dwt_levels = descriptor.dwt_levels.clamp(MINIMUM_DWT_LEVELS, ceiling);
    if descriptor.color_mode == ColorMode::Grayscale {
        descriptor.subsampling = false;
    }
    Ok(())
}

pub fn write(descriptor: &SqzDescriptor, writer: &mut BitWriter<'_>) -> Result<(), Eob> {
    writer.write_bits(MAGIC as u32, 8)?;
    writer.write_bits(descriptor.width - 1, 16)?;
    writer.write_bits(descriptor.height - 1, 16)?;
    writer.write_bits(descriptor.color_mode as u32, 2)?;
    writer.write_bits((descriptor.dwt_levels - 1) as u32, 3)?;
    writer.write_bits(descriptor.scan_order as u32, 2)?;
    writer.write_bits(descriptor.subsampling as u32, 1)?;
    Ok(())
}

pub fn read(reader: &mut BitReader<'_>) -> Result<SqzDescriptor, SqzError> {
    let magic = reader
        .read_bits(8)
        .map_err(|_| SqzError::InvalidParameter)?;
    if magic != MAGIC as u32 {
        return Err(SqzError::InvalidParameter);
    }
    let mut field = |bits: u32| -> Result<u32, SqzError> {
        reader.read_bits(bits).map_err(|_| SqzError::InvalidParameter)
    };
    let width = field(16)? + 1;
    let height = field(16)? + 1;
    let mode_bits = field(2)?;
    let dwt_levels = (field(3)? + 1) as u8;
    let scan_bits = field(2)?;
    let subsampling = field(1)? == 1;

    let color_mode =
        ColorMode::try_from(mode_bits as u8).map_err(|_| SqzError::DataCorrupted)?;
    let scan_order =
        ScanOrder::try_from(scan_bits as u8).map_err(|_| SqzError::DataCorrupted)?;

    if width < MINIMUM_DIMENSION
        || width > MAXIMUM_DIMENSION
        || height < MINIMUM_DIMENSION
        || height > MAXIMUM_DIMENSION
    {
        return Err(SqzError::DataCorrupted);
    }
    if dwt_levels > max_levels(width, height) {
        return Err(SqzError::DataCorrupted);
    }

    Ok(SqzDescriptor {
        width,
        height,
        color_mode,
        dwt_levels,
        scan_order,
        subsampling,
    })
}
