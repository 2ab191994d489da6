/// First byte of every SQZ stream.
pub const MAGIC: u8 = 0xA5;

/// Serialized header size in bytes (48 bits, MSB-first).
pub const HEADER_SIZE_IN_BYTES: usize = 6;

pub const MINIMUM_DIMENSION: u32 = 8;
pub const MAXIMUM_DIMENSION: u32 = 65535;

pub const MINIMUM_DWT_LEVELS: u8 = 1;
pub const MAXIMUM_DWT_LEVELS: u8 = 8;

/// Rows/columns shorter than this are left untransformed by a DWT pass.
pub const MIN_TRANSFORM_LENGTH: usize = MINIMUM_DIMENSION as usize / 2;

/// Highest word-bit index of a sign-magnitude coefficient (bit 0 is the
/// sign, bits 1..=14 the magnitude).
pub const MAX_BITPLANE: u8 = 14;

/// Largest representable coefficient magnitude; DWT output saturates here.
pub const MAX_MAGNITUDE: i32 = (1 << MAX_BITPLANE) - 1;

/// Width of the per-subband `max_bitplane` field.
pub const BITPLANE_FIELD_BITS: u32 = 4;

// Snake scan tile geometry before the odd-parity adjustments.
pub const SNAKE_TILE_WIDTH: u32 = 4;
pub const SNAKE_TILE_HEIGHT: u32 = 15;

/// Level shift applied to the luma plane of the logl1 transform.
pub const LOGL1_LEVEL_OFFSET: i32 = 221;

/// Level shift applied to the L plane of the Oklab transform (2^11).
pub const OKLAB_LEVEL_OFFSET: i32 = 2048;
