//! C Foreign Function Interface for sqz-rs.
//!
//! Mirrors the pointer-based caller contract: the encode budget is an
//! in/out byte count, and a decode with `*dest_size == 0` fills the
//! descriptor, reports the required size and returns
//! `SQZ_BUFFER_TOO_SMALL` without decoding.

use std::os::raw::c_uchar;

use crate::{ColorMode, ScanOrder, SqzDecoder, SqzDescriptor, SqzEncoder, SqzError};

/// Status codes returned by every entry point.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqzStatus {
    Ok = 0,
    NotEnoughMemory = 1,
    InvalidParameter = 2,
    BufferTooSmall = 3,
    DataCorrupted = 4,
}

impl From<SqzError> for SqzStatus {
    fn from(error: SqzError) -> Self {
        match error {
            SqzError::NotEnoughMemory => Self::NotEnoughMemory,
            SqzError::InvalidParameter => Self::InvalidParameter,
            SqzError::BufferTooSmall => Self::BufferTooSmall,
            SqzError::DataCorrupted => Self::DataCorrupted,
        }
    }
}

/// C-visible image descriptor.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SqzDescriptorC {
    pub width: u32,
    pub height: u32,
    /// 0 = grayscale, 1 = YCoCg-R, 2 = Oklab, 3 = logl1.
    pub color_mode: u8,
    /// Wavelet levels, 1..=8.
    pub dwt_levels: u8,
    /// 0 = raster, 1 = snake, 2 = Morton, 3 = Hilbert.
    pub scan_order: u8,
    /// Nonzero delays chroma by one schedule round.
    pub subsampling: u8,
}

impl SqzDescriptorC {
    fn to_descriptor(self) -> Result<SqzDescriptor, SqzStatus> {
        let color_mode =
            ColorMode::try_from(self.color_mode).map_err(|_| SqzStatus::InvalidParameter)?;
        let scan_order =
            ScanOrder::try_from(self.scan_order).map_err(|_| SqzStatus::InvalidParameter)?;
        Ok(SqzDescriptor {
            width: self.width,
            height: self.height,
            color_mode,
            dwt_levels: self.dwt_levels,
            scan_order,
            subsampling: self.subsampling != 0,
        })
    }

    fn from_descriptor(descriptor: &SqzDescriptor) -> Self {
        Self {
            width: descriptor.width,
            height: descriptor.height,
            color_mode: descriptor.color_mode as u8,
            dwt_levels: descriptor.dwt_levels,
            scan_order: descriptor.scan_order as u8,
            subsampling: descriptor.subsampling as u8,
        }
    }
}

/// Encodes `source` into `dest`, writing at most `*budget` bytes.
///
/// On success `*budget` holds the bytes actually written and
/// `*descriptor` the (possibly clamped) parameters used. The
/// destination must be zeroed by the caller.
///
/// # Safety
/// `source` must point to the pixel buffer the descriptor describes,
/// `dest` to `*budget` writable bytes, and the pointer arguments must
/// be valid and non-null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sqz_encode(
    source: *const c_uchar,
    dest: *mut c_uchar,
    descriptor: *mut SqzDescriptorC,
    budget: *mut usize,
) -> SqzStatus {
    if source.is_null() || dest.is_null() || descriptor.is_null() || budget.is_null() {
        return SqzStatus::InvalidParameter;
    }
    let requested = unsafe { (*descriptor).to_descriptor() };
    let requested = match requested {
        Ok(requested) => requested,
        Err(status) => return status,
    };
    let pixels =
        unsafe { std::slice::from_raw_parts(source, requested.pixel_buffer_size()) };
    let stream = unsafe { std::slice::from_raw_parts_mut(dest, *budget) };

    let mut encoder = SqzEncoder::new(stream);
    if let Err(error) = encoder.set_descriptor(requested) {
        return error.into();
    }
    match encoder.encode(pixels) {
        Ok(written) => {
            unsafe {
                *budget = written;
                if let Some(clamped) = encoder.descriptor() {
                    *descriptor = SqzDescriptorC::from_descriptor(clamped);
                }
            }
            SqzStatus::Ok
        }
        Err(error) => error.into(),
    }
}

/// Decodes `src_size` bytes of `source` into `dest`.
///
/// When `*dest_size` is zero the function fills `*descriptor`, stores
/// the required byte count in `*dest_size` and returns
/// `SQZ_BUFFER_TOO_SMALL`; that round trip is the intended sizing
/// protocol. Truncated payloads decode to best-effort reconstructions.
///
/// # Safety
/// `source` must point to `src_size` readable bytes, `dest` to
/// `*dest_size` writable bytes, and the pointer arguments must be
/// valid and non-null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sqz_decode(
    source: *const c_uchar,
    dest: *mut c_uchar,
    src_size: usize,
    dest_size: *mut usize,
    descriptor: *mut SqzDescriptorC,
) -> SqzStatus {
    if source.is_null() || dest_size.is_null() || descriptor.is_null() {
        return SqzStatus::InvalidParameter;
    }
    let stream = unsafe { std::slice::from_raw_parts(source, src_size) };
    let mut decoder = SqzDecoder::new(stream);
    let required = match decoder.destination_size() {
        Ok(required) => required,
        Err(error) => return error.into(),
    };
    if let Some(parsed) = decoder.descriptor() {
        unsafe { *descriptor = SqzDescriptorC::from_descriptor(parsed) };
    }
    let capacity = unsafe { *dest_size };
    if capacity == 0 {
        unsafe { *dest_size = required };
        return SqzStatus::BufferTooSmall;
    }
    if dest.is_null() {
        return SqzStatus::InvalidParameter;
    }
    let pixels = unsafe { std::slice::from_raw_parts_mut(dest, capacity) };
    match decoder.decode(pixels) {
        Ok(()) => {
            unsafe { *dest_size = required };
            SqzStatus::Ok
        }
        Err(error) => error.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffi_roundtrip_and_sizing_protocol() {
        let pixels: Vec<u8> = (0..64).map(|i| (i * 4) as u8).collect();
        let mut stream = vec![0u8; 1024];
        let mut descriptor = SqzDescriptorC {
            width: 8,
            height: 8,
            color_mode: 0,
            dwt_levels: 1,
            scan_order: 0,
            subsampling: 0,
        };
        let mut budget = stream.len();
        let status = unsafe {
            sqz_encode(
                pixels.as_ptr(),
                stream.as_mut_ptr(),
                &mut descriptor,
                &mut budget,
            )
        };
        assert_eq!(status, SqzStatus::Ok);
        assert!(budget >= 6);

        // Sizing pass.
        let mut parsed = SqzDescriptorC {
            width: 0,
            height: 0,
            color_mode: 0,
            dwt_levels: 0,
            scan_order: 0,
            subsampling: 0,
        };
        let mut dest_size = 0usize;
        let status = unsafe {
            sqz_decode(
                stream.as_ptr(),
                std::ptr::null_mut(),
                budget,
                &mut dest_size,
                &mut parsed,
            )
        };
        assert_eq!(status, SqzStatus::BufferTooSmall);
        assert_eq!(dest_size, 64);
        assert_eq!(parsed.width, 8);

        // Decode pass.
        let mut decoded = vec![0u8; dest_size];
        let status = unsafe {
            sqz_decode(
                stream.as_ptr(),
                decoded.as_mut_ptr(),
                budget,
                &mut dest_size,
                &mut parsed,
            )
        };
        assert_eq!(status, SqzStatus::Ok);
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn test_null_pointers_rejected() {
        let mut budget = 16usize;
        let status = unsafe {
            sqz_encode(
                std::ptr::null(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                &mut budget,
            )
        };
        assert_eq!(status, SqzStatus::InvalidParameter);
    }
}
