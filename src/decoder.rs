//! End-to-end decoder.

use crate::bit_io::BitReader;
use crate::coder::round_truncated_coefficients;
use crate::error::SqzError;
use crate::plane::PlaneSet;
use crate::{color, dwt, header, schedule, subband};
use crate::SqzDescriptor;

/// Progressive decoder over a source byte slice.
///
/// Any prefix of a valid stream (down to the 6-byte header) decodes to
/// a best-effort reconstruction with the full image dimensions;
/// truncation is the normal operating mode, never an error.
pub struct SqzDecoder<'a> {
    source: &'a [u8],
    descriptor: Option<SqzDescriptor>,
}

impl<'a> SqzDecoder<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            descriptor: None,
        }
    }

    /// Parses and validates the stream header.
    pub fn read_header(&mut self) -> Result<(), SqzError> {
        let mut reader = BitReader::new(self.source);
        self.descriptor = Some(header::read(&mut reader)?);
        Ok(())
    }

    pub fn descriptor(&self) -> Option<&SqzDescriptor> {
        self.descriptor.as_ref()
    }

    /// Required destination size in bytes, reading the header first if
    /// needed.
    pub fn destination_size(&mut self) -> Result<usize, SqzError> {
        if self.descriptor.is_none() {
            self.read_header()?;
        }
        match &self.descriptor {
            Some(descriptor) => Ok(descriptor.pixel_buffer_size()),
            None => Err(SqzError::InvalidParameter),
        }
    }

    /// Decodes into `destination` (packed grayscale or RGB bytes).
    pub fn decode(&mut self, destination: &mut [u8]) -> Result<(), SqzError> {
        let required = self.destination_size()?;
        if destination.len() < required {
            return Err(SqzError::BufferTooSmall);
        }
        let descriptor = match self.descriptor {
            Some(descriptor) => descriptor,
            None => return Err(SqzError::InvalidParameter),
        };
        let width = descriptor.width as usize;
        let height = descriptor.height as usize;
        let plane_count = descriptor.plane_count();

        let mut reader = BitReader::new(self.source);
        header::read(&mut reader)?;

        let mut planes = PlaneSet::new(width, height, plane_count)?;
        let mut bands = subband::build_subbands(width, height, plane_count, descriptor.dwt_levels);
        schedule::assign_rounds(
            &mut bands,
            descriptor.color_mode,
            descriptor.dwt_levels,
            descriptor.subsampling,
        );
        schedule::decode_stream(&mut bands, &mut planes, descriptor.scan_order, &mut reader)?;

        round_truncated_coefficients(&mut bands, &mut planes);
        for plane in 0..plane_count {
            subband::from_sign_magnitude(planes.plane_mut(plane));
            dwt::inverse(
                planes.plane_mut(plane),
                width,
                width,
                height,
                descriptor.dwt_levels,
            );
        }
        color::inverse(descriptor.color_mode, &planes, destination);
        Ok(())
    }
}
