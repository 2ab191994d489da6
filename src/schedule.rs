//! Cross-subband scheduling.
//!
//! A static table assigns every `(color mode, plane, level,
//! orientation)` a round; lower rounds serve subjectively more
//! important bits first. Within a round subbands are visited plane 0
//! first, levels deepest to shallowest, orientations in encoding
//! order. The encoder and decoder run the identical loop, which is
//! what lets the decoder attribute bits without any framing.

use crate::bit_io::{BitReader, BitWriter};
use crate::coder::{decode_bitplane, encode_bitplane};
use crate::constants::{BITPLANE_FIELD_BITS, MAX_BITPLANE};
use crate::error::SqzError;
use crate::plane::PlaneSet;
use crate::subband::{max_bitplane, Orientation, Subband};
use crate::{ColorMode, ScanOrder};

/// Rounds by which chroma planes trail luma, per color mode
/// (Grayscale, YCoCg-R, Oklab, logl1).
const CHROMA_LAG: [u32; 4] = [0, 1, 2, 2];

/// Schedule round for one subband. The deepest LL opens at round 0;
/// HL/LH/HH of depth `d` below the deepest level open at `2d+1` and
/// `2d+2`; chroma trails per mode, one more when subsampling is set.
pub fn subband_round(
    mode: ColorMode,
    plane: usize,
    level: u8,
    orientation: Orientation,
    levels: u8,
    subsampling: bool,
) -> u32 {
    let depth = (levels - 1 - level) as u32;
    let base = match orientation {
        Orientation::Ll => 0,
        Orientation::Hl | Orientation::Lh => 2 * depth + 1,
        Orientation::Hh => 2 * depth + 2,
    };
    let lag = if plane == 0 {
        0
    } else {
        CHROMA_LAG[mode as usize] + subsampling as u32
    };
    base + lag
}

pub fn assign_rounds(bands: &mut [Subband], mode: ColorMode, levels: u8, subsampling: bool) {
    for band in bands.iter_mut() {
        band.round = subband_round(
            mode,
            band.plane,
            band.level,
            band.orientation,
            levels,
            subsampling,
        );
    }
}

/// Drives the encoder until every subband is drained or the budget is
/// exhausted. A budget hit is the normal terminal condition and
/// returns `Ok`.
pub fn encode_stream(
    bands: &mut [Subband],
    planes: &PlaneSet,
    order: ScanOrder,
    writer: &mut BitWriter<'_>,
) -> Result<(), SqzError> {
    let stride = planes.width();
    let mut round = 0u32;
    loop {
        for band in bands.iter_mut() {
            if round < band.round {
                continue;
            }
            if band.state.is_none() {
                band.initialize(order)?;
                let plane = planes.plane(band.plane);
                band.max_bitplane = max_bitplane(plane, stride, band);
                band.bitplane = band.max_bitplane;
                if writer
                    .write_bits(band.max_bitplane as u32, BITPLANE_FIELD_BITS)
                    .is_err()
                {
                    return Ok(());
                }
            }
            if band.bitplane > 0 {
                let plane = planes.plane(band.plane);
                match encode_bitplane(band, plane, stride, writer) {
                    Ok(()) => band.bitplane -= 1,
                    Err(_) => return Ok(()),
                }
            }
        }
        if bands
            .iter()
            .all(|band| band.state.is_some() && band.bitplane == 0)
        {
            return Ok(());
        }
        round += 1;
    }
}

/// Mirror of [`encode_stream`]; stops extending state on the first
/// exhausted read and leaves a best-effort reconstruction.
pub fn decode_stream(
    bands: &mut [Subband],
    planes: &mut PlaneSet,
    order: ScanOrder,
    reader: &mut BitReader<'_>,
) -> Result<(), SqzError> {
    let stride = planes.width();
    let mut round = 0u32;
    loop {
        for band in bands.iter_mut() {
            if round < band.round {
                continue;
            }
            if band.state.is_none() {
                band.initialize(order)?;
                match reader.read_bits(BITPLANE_FIELD_BITS) {
                    Ok(field) => {
                        band.max_bitplane = (field as u8).min(MAX_BITPLANE);
                        band.bitplane = band.max_bitplane;
                    }
                    Err(_) => return Ok(()),
                }
            }
            if band.bitplane > 0 {
                let plane = planes.plane_mut(band.plane);
                match decode_bitplane(band, plane, stride, reader) {
                    Ok(()) => band.bitplane -= 1,
                    Err(_) => return Ok(()),
                }
            }
        }
        if bands
            .iter()
            .all(|band| band.state.is_some() && band.bitplane == 0)
        {
            return Ok(());
        }
        round += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subband::{build_subbands, to_sign_magnitude};

    #[test]
    fn test_deepest_ll_opens_first() {
        let levels = 3;
        let round = subband_round(ColorMode::Grayscale, 0, levels - 1, Orientation::Ll, levels, false);
        assert_eq!(round, 0);
    }

    #[test]
    fn test_shallow_levels_open_later() {
        let levels = 3;
        let mut previous = 0;
        for level in (0..levels).rev() {
            let round = subband_round(ColorMode::Grayscale, 0, level, Orientation::Hh, levels, false);
            assert!(round > previous || level == levels - 1);
            previous = round;
        }
        // The finest HH is served last of all orientations.
        assert_eq!(
            subband_round(ColorMode::Grayscale, 0, 0, Orientation::Hh, levels, false),
            2 * (levels as u32 - 1) + 2
        );
    }

    #[test]
    fn test_chroma_lags_luma() {
        for mode in [ColorMode::YCoCgR, ColorMode::Oklab, ColorMode::Logl1] {
            let luma = subband_round(mode, 0, 1, Orientation::Hl, 2, false);
            let chroma = subband_round(mode, 1, 1, Orientation::Hl, 2, false);
            assert!(chroma > luma, "{mode:?} chroma must trail luma");
            let chroma_sub = subband_round(mode, 1, 1, Orientation::Hl, 2, true);
            assert_eq!(chroma_sub, chroma + 1);
        }
    }

    fn scheduled_bands(width: usize, height: usize, levels: u8) -> Vec<Subband> {
        let mut bands = build_subbands(width, height, 1, levels);
        assign_rounds(&mut bands, ColorMode::Grayscale, levels, false);
        bands
    }

    #[test]
    fn test_stream_roundtrip_without_transforms() {
        let width = 16;
        let height = 16;
        let levels = 2;
        let mut planes = PlaneSet::new(width, height, 1).unwrap();
        for (i, value) in planes.plane_mut(0).iter_mut().enumerate() {
            *value = ((i as i32 * 37) % 255 - 127) as i16;
        }
        to_sign_magnitude(planes.plane_mut(0));
        let reference = planes.plane(0).to_vec();

        let mut buffer = vec![0u8; 4 * width * height];
        let bytes;
        {
            let mut bands = scheduled_bands(width, height, levels);
            let mut writer = BitWriter::new(&mut buffer);
            encode_stream(&mut bands, &planes, ScanOrder::Snake, &mut writer).unwrap();
            bytes = writer.bytes_used();
        }

        let mut decoded = PlaneSet::new(width, height, 1).unwrap();
        let mut bands = scheduled_bands(width, height, levels);
        let mut reader = BitReader::new(&buffer[..bytes]);
        decode_stream(&mut bands, &mut decoded, ScanOrder::Snake, &mut reader).unwrap();
        assert_eq!(decoded.plane(0), &reference[..]);
    }

    #[test]
    fn test_stream_truncation_is_tolerated() {
        let width = 16;
        let height = 16;
        let levels = 2;
        let mut planes = PlaneSet::new(width, height, 1).unwrap();
        for (i, value) in planes.plane_mut(0).iter_mut().enumerate() {
            *value = ((i as i32 * 53) % 400 - 200) as i16;
        }
        to_sign_magnitude(planes.plane_mut(0));

        let mut buffer = vec![0u8; 4 * width * height];
        {
            let mut bands = scheduled_bands(width, height, levels);
            let mut writer = BitWriter::new(&mut buffer);
            encode_stream(&mut bands, &planes, ScanOrder::Raster, &mut writer).unwrap();
        }

        for take in [0usize, 1, 2, 5, 13, 40, 100] {
            let mut decoded = PlaneSet::new(width, height, 1).unwrap();
            let mut bands = scheduled_bands(width, height, levels);
            let mut reader = BitReader::new(&buffer[..take]);
            decode_stream(&mut bands, &mut decoded, ScanOrder::Raster, &mut reader).unwrap();
            for &word in decoded.plane(0) {
                assert!(word >= 0, "decoded word went negative at take={take}");
            }
        }
    }
}
