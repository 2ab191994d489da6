//! Subband geometry and coding state.
//!
//! After the forward DWT a plane tiles exactly into subbands: LL at the
//! deepest level plus HL/LH/HH at every level. Coefficients are
//! remapped to sign-magnitude form before coding (bit 0 sign, bits
//! 1..=14 magnitude) so the leading bit has a uniform meaning for
//! positive and negative values.

use num_enum::TryFromPrimitive;

use crate::arena::{NodeArena, NodeList};
use crate::constants::{MAX_BITPLANE, MAX_MAGNITUDE};
use crate::dwt::level_dimensions;
use crate::error::SqzError;
use crate::scan::scan_positions;
use crate::ScanOrder;

/// Subband orientation, in header/traversal encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Orientation {
    Ll = 0,
    Hl = 1,
    Lh = 2,
    Hh = 3,
}

/// Per-subband list state over a private node arena.
pub struct SubbandState {
    pub arena: NodeArena,
    pub lip: NodeList,
    pub lsp: NodeList,
    pub nsp: NodeList,
}

/// One rectangular subband view into a plane.
pub struct Subband {
    pub plane: usize,
    pub level: u8,
    pub orientation: Orientation,
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
    /// Schedule round at which the subband becomes eligible.
    pub round: u32,
    pub max_bitplane: u8,
    /// Current cursor; the subband is inert once it reaches zero.
    pub bitplane: u8,
    pub state: Option<SubbandState>,
}

impl Subband {
    /// Builds the arena and the LIP by walking the configured scan
    /// order over every position. LSP and NSP start empty.
    pub fn initialize(&mut self, order: ScanOrder) -> Result<(), SqzError> {
        let mut arena = NodeArena::with_capacity(self.width * self.height)?;
        let mut lip = NodeList::new();
        for (x, y) in scan_positions(order, self.width as u32, self.height as u32) {
            let node = arena.alloc(x as u16, y as u16);
            lip.push(&mut arena, node);
        }
        self.state = Some(SubbandState {
            arena,
            lip,
            lsp: NodeList::new(),
            nsp: NodeList::new(),
        });
        Ok(())
    }
}

/// Remaps a plane to sign-magnitude in place. Magnitudes saturate at
/// the 14-bit limit so the word always fits bits 0..=14.
pub fn to_sign_magnitude(plane: &mut [i16]) {
    for value in plane.iter_mut() {
        let c = *value as i32;
        *value = if c >= 0 {
            (2 * c.min(MAX_MAGNITUDE)) as i16
        } else {
            ((2 * (-c).min(MAX_MAGNITUDE)) | 1) as i16
        };
    }
}

/// Inverts [`to_sign_magnitude`].
pub fn from_sign_magnitude(plane: &mut [i16]) {
    for value in plane.iter_mut() {
        let word = *value as i32;
        let magnitude = word >> 1;
        *value = if word & 1 == 1 {
            (-magnitude) as i16
        } else {
            magnitude as i16
        };
    }
}

/// Word-bit index of the leading magnitude bit of the largest
/// sign-magnitude coefficient in the subband; 0 when the subband is
/// all zero.
pub fn max_bitplane(plane: &[i16], stride: usize, band: &Subband) -> u8 {
    let mut largest = 0i32;
    for y in 0..band.height {
        let row = (band.y0 + y) * stride + band.x0;
        for &word in &plane[row..row + band.width] {
            largest = largest.max(word as i32);
        }
    }
    if largest < 2 {
        0
    } else {
        let leading = 31 - (largest as u32).leading_zeros();
        (leading as u8).min(MAX_BITPLANE)
    }
}

/// Enumerates the subbands of all planes in scheduler traversal order:
/// plane-major, levels deepest to shallowest, orientations LL, HL, LH,
/// HH, with LL existing only at the deepest level.
pub fn build_subbands(width: usize, height: usize, planes: usize, levels: u8) -> Vec<Subband> {
    let mut bands = Vec::new();
    for plane in 0..planes {
        for level in (0..levels).rev() {
            let (region_w, region_h) = level_dimensions(width, height, level);
            let low_w = (region_w + 1) / 2;
            let high_w = region_w / 2;
            let low_h = (region_h + 1) / 2;
            let high_h = region_h / 2;
            for code in 0..4u8 {
                let orientation = match Orientation::try_from(code) {
                    Ok(orientation) => orientation,
                    Err(_) => continue,
                };
                if orientation == Orientation::Ll && level != levels - 1 {
                    continue;
                }
                let (x0, y0, w, h) = match orientation {
                    Orientation::Ll => (0, 0, low_w, low_h),
                    Orientation::Hl => (low_w, 0, high_w, low_h),
                    Orientation::Lh => (0, low_h, low_w, high_h),
                    Orientation::Hh => (low_w, low_h, high_w, high_h),
                };
                if w == 0 || h == 0 {
                    continue;
                }
                bands.push(Subband {
                    plane,
                    level,
                    orientation,
                    x0,
                    y0,
                    width: w,
                    height: h,
                    round: 0,
                    max_bitplane: 0,
                    bitplane: 0,
                    state: None,
                });
            }
        }
    }
    bands
}
