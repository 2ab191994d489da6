//! End-to-end encoder.

use crate::bit_io::BitWriter;
use crate::error::SqzError;
use crate::plane::PlaneSet;
use crate::{color, dwt, header, schedule, subband};
use crate::SqzDescriptor;

/// Progressive encoder over a caller-supplied destination buffer.
///
/// The destination length is the byte budget: encoding stops cleanly
/// the moment the buffer is full, and the bytes written so far form a
/// valid truncated stream. The buffer must be zeroed by the caller;
/// bits are ORed into place.
pub struct SqzEncoder<'a> {
    destination: &'a mut [u8],
    descriptor: Option<SqzDescriptor>,
}

impl<'a> SqzEncoder<'a> {
    pub fn new(destination: &'a mut [u8]) -> Self {
        Self {
            destination,
            descriptor: None,
        }
    }

    /// Validates and stores the descriptor. The level count may be
    /// clamped; read back with [`descriptor`](Self::descriptor).
    pub fn set_descriptor(&mut self, descriptor: SqzDescriptor) -> Result<(), SqzError> {
        let mut descriptor = descriptor;
        header::validate_and_clamp(&mut descriptor)?;
        self.descriptor = Some(descriptor);
        Ok(())
    }

    pub fn descriptor(&self) -> Option<&SqzDescriptor> {
        self.descriptor.as_ref()
    }

    /// Encodes `source` (packed grayscale or RGB bytes, row-major) and
    /// returns the number of bytes written.
    pub fn encode(&mut self, source: &[u8]) -> Result<usize, SqzError> {
        let descriptor = self.descriptor.ok_or(SqzError::InvalidParameter)?;
        if source.len() < descriptor.pixel_buffer_size() {
            return Err(SqzError::InvalidParameter);
        }
        let width = descriptor.width as usize;
        let height = descriptor.height as usize;
        let plane_count = descriptor.plane_count();

        let mut writer = BitWriter::new(self.destination);
        if header::write(&descriptor, &mut writer).is_err() {
            // Budget smaller than the header; still a clean stop.
            return Ok(writer.bytes_used());
        }

        let mut planes = PlaneSet::new(width, height, plane_count)?;
        color::forward(descriptor.color_mode, source, &mut planes);
        for plane in 0..plane_count {
            dwt::forward(
                planes.plane_mut(plane),
                width,
                width,
                height,
                descriptor.dwt_levels,
            );
            subband::to_sign_magnitude(planes.plane_mut(plane));
        }

        let mut bands = subband::build_subbands(width, height, plane_count, descriptor.dwt_levels);
        schedule::assign_rounds(
            &mut bands,
            descriptor.color_mode,
            descriptor.dwt_levels,
            descriptor.subsampling,
        );
        schedule::encode_stream(&mut bands, &planes, descriptor.scan_order, &mut writer)?;

        Ok(writer.bytes_used())
    }
}
