//! Spatial scan orders over rectangular subbands.
//!
//! Each order enumerates every position of a `width x height` rectangle
//! exactly once, deterministically from the dimensions alone. The
//! encoder and decoder both build the initial LIP by walking the order
//! configured in the header, so the enumeration is part of the
//! bitstream contract.

use crate::constants::{SNAKE_TILE_HEIGHT, SNAKE_TILE_WIDTH};
use crate::ScanOrder;

/// Uniform iterator over the positions of one scan order.
pub enum ScanIter {
    Raster(RasterScan),
    Snake(SnakeScan),
    Morton(MortonScan),
    Hilbert(HilbertScan),
}

/// Enumerates `(x, y)` positions for `order` over a `width x height`
/// rectangle. Dimensions must be at least 1.
pub fn scan_positions(order: ScanOrder, width: u32, height: u32) -> ScanIter {
    debug_assert!(width >= 1 && height >= 1);
    match order {
        ScanOrder::Raster => ScanIter::Raster(RasterScan::new(width, height)),
        ScanOrder::Snake => ScanIter::Snake(SnakeScan::new(width, height)),
        ScanOrder::Morton => ScanIter::Morton(MortonScan::new(width, height)),
        ScanOrder::Hilbert => ScanIter::Hilbert(HilbertScan::new(width, height)),
    }
}

impl Iterator for ScanIter {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<(u32, u32)> {
        match self {
            ScanIter::Raster(s) => s.next(),
            ScanIter::Snake(s) => s.next(),
            ScanIter::Morton(s) => s.next(),
            ScanIter::Hilbert(s) => s.next(),
        }
    }
}

/// Row-major, left-to-right, top-to-bottom.
pub struct RasterScan {
    width: u32,
    height: u32,
    x: u32,
    y: u32,
}

impl RasterScan {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            x: 0,
            y: 0,
        }
    }
}

impl Iterator for RasterScan {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<(u32, u32)> {
        if self.y >= self.height {
            return None;
        }
        let position = (self.x, self.y);
        self.x += 1;
        if self.x == self.width {
            self.x = 0;
            self.y += 1;
        }
        Some(position)
    }
}

/// Tile width starting from the default, offset +1, -1, +2, -2, ...
/// until the tile grid has an odd column count.
fn snake_tile_width(width: u32) -> u32 {
    let base = SNAKE_TILE_WIDTH as i64;
    let mut attempt = 0i64;
    loop {
        let offset = if attempt == 0 {
            0
        } else if attempt % 2 == 1 {
            (attempt + 1) / 2
        } else {
            -(attempt / 2)
        };
        attempt += 1;
        let tile_width = base + offset;
        if tile_width < 1 {
            continue;
        }
        let tile_width = tile_width as u32;
        let columns = (width + tile_width - 1) / tile_width;
        if columns % 2 == 1 {
            return tile_width;
        }
    }
}

/// Tile height starting from the default, offset +2, -2, +4, -4, ...
/// (parity preserved, so full bands stay odd) until the remainder band
/// `height % tile_height` is odd or empty. Terminates: a tile height of
/// 1 always leaves no remainder.
fn snake_tile_height(height: u32) -> u32 {
    let base = SNAKE_TILE_HEIGHT as i64;
    let mut attempt = 0i64;
    loop {
        let offset = if attempt == 0 {
            0
        } else if attempt % 2 == 1 {
            attempt + 1
        } else {
            -attempt
        };
        attempt += 1;
        let tile_height = base + offset;
        if tile_height < 1 {
            continue;
        }
        let tile_height = tile_height as u32;
        let remainder = height % tile_height;
        if remainder == 0 || remainder % 2 == 1 {
            return tile_height;
        }
    }
}

/// Boustrophedon over a grid of tiles, serpentine rows within each
/// tile. Odd band heights and an odd tile column count make every tile
/// exit adjacent to the next entry, so successive positions always
/// differ by Manhattan distance exactly 1.
pub struct SnakeScan {
    width: u32,
    height: u32,
    tile_width: u32,
    columns: u32,
    tile_height: u32,
    band_y: u32,
    band_height: u32,
    band_index: u32,
    tile_step: u32,
    row_step: u32,
    column_step: u32,
    done: bool,
}

impl SnakeScan {
    fn new(width: u32, height: u32) -> Self {
        let tile_width = snake_tile_width(width);
        let tile_height = snake_tile_height(height);
        let columns = (width + tile_width - 1) / tile_width;
        Self {
            width,
            height,
            tile_width,
            columns,
            tile_height,
            band_y: 0,
            band_height: tile_height.min(height),
            band_index: 0,
            tile_step: 0,
            row_step: 0,
            column_step: 0,
            done: false,
        }
    }
}

impl Iterator for SnakeScan {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<(u32, u32)> {
        if self.done {
            return None;
        }

        let left_to_right = self.band_index % 2 == 0;
        let tile_index = if left_to_right {
            self.tile_step
        } else {
            self.columns - 1 - self.tile_step
        };
        let tile_x = tile_index * self.tile_width;
        let tile_width = self.tile_width.min(self.width - tile_x);

        // Even-numbered tile visits enter at the band top, odd ones at
        // the bottom; rows alternate direction starting towards the
        // band's traversal direction.
        let enters_top = self.tile_step % 2 == 0;
        let y = if enters_top {
            self.band_y + self.row_step
        } else {
            self.band_y + self.band_height - 1 - self.row_step
        };
        let rightward = (self.row_step % 2 == 0) == left_to_right;
        let x = if rightward {
            tile_x + self.column_step
        } else {
            tile_x + tile_width - 1 - self.column_step
        };

        self.column_step += 1;
        if self.column_step == tile_width {
            self.column_step = 0;
            self.row_step += 1;
            if self.row_step == self.band_height {
                self.row_step = 0;
                self.tile_step += 1;
                if self.tile_step == self.columns {
                    self.tile_step = 0;
                    self.band_index += 1;
                    self.band_y += self.band_height;
                    if self.band_y >= self.height {
                        self.done = true;
                    } else {
                        self.band_height = self.tile_height.min(self.height - self.band_y);
                    }
                }
            }
        }

        Some((x, y))
    }
}

fn ceil_log2(value: u32) -> u32 {
    debug_assert!(value >= 1);
    32 - (value - 1).leading_zeros()
}

/// Extracts the even-indexed bits of `value` into the low half.
fn compact_even_bits(mut value: u32) -> u32 {
    value &= 0x5555_5555;
    value = (value | (value >> 1)) & 0x3333_3333;
    value = (value | (value >> 2)) & 0x0F0F_0F0F;
    value = (value | (value >> 4)) & 0x00FF_00FF;
    value = (value | (value >> 8)) & 0x0000_FFFF;
    value
}

/// Z-order: the low `2r` bits of the running index interleave as
/// `(x, y)`; the remaining high bits extend the longer axis. Indices
/// decoding outside the rectangle are skipped.
pub struct MortonScan {
    width: u32,
    height: u32,
    axis_bits: u32,
    x_major: bool,
    index: u64,
    emitted: u64,
    total: u64,
}

impl MortonScan {
    fn new(width: u32, height: u32) -> Self {
        // The ceiling keeps short axes with non-power-of-two extents
        // reachable through the interleaved bits alone.
        let axis_bits = ceil_log2(width.min(height));
        Self {
            width,
            height,
            axis_bits,
            x_major: width >= height,
            index: 0,
            emitted: 0,
            total: width as u64 * height as u64,
        }
    }
}

impl Iterator for MortonScan {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<(u32, u32)> {
        if self.emitted == self.total {
            return None;
        }
        loop {
            let low_mask = (1u64 << (2 * self.axis_bits)) - 1;
            let low = (self.index & low_mask) as u32;
            let high = (self.index >> (2 * self.axis_bits)) as u32;
            self.index += 1;

            let x_low = compact_even_bits(low);
            let y_low = compact_even_bits(low >> 1);
            let (x, y) = if self.x_major {
                (x_low | (high << self.axis_bits), y_low)
            } else {
                (x_low, y_low | (high << self.axis_bits))
            };
            if x < self.width && y < self.height {
                self.emitted += 1;
                return Some((x, y));
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HilbertFrame {
    x: i64,
    y: i64,
    ax: i64,
    ay: i64,
    bx: i64,
    by: i64,
}

/// Generalized Hilbert curve over arbitrary rectangles, iterative with
/// an explicit frame stack. The starting basis puts the long axis
/// first; each frame splits along A when `2|A| > 3|B|`, otherwise along
/// B, nudging the half-vector so the outer split dimension stays even.
pub struct HilbertScan {
    stack: Vec<HilbertFrame>,
    run_x: i64,
    run_y: i64,
    run_dx: i64,
    run_dy: i64,
    run_left: i64,
}

impl HilbertScan {
    fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as i64, height as i64);
        let root = if w >= h {
            HilbertFrame {
                x: 0,
                y: 0,
                ax: w,
                ay: 0,
                bx: 0,
                by: h,
            }
        } else {
            HilbertFrame {
                x: 0,
                y: 0,
                ax: 0,
                ay: h,
                bx: w,
                by: 0,
            }
        };
        let mut stack = Vec::with_capacity(64);
        stack.push(root);
        Self {
            stack,
            run_x: 0,
            run_y: 0,
            run_dx: 0,
            run_dy: 0,
            run_left: 0,
        }
    }
}

impl Iterator for HilbertScan {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<(u32, u32)> {
        loop {
            if self.run_left > 0 {
                let position = (self.run_x as u32, self.run_y as u32);
                self.run_x += self.run_dx;
                self.run_y += self.run_dy;
                self.run_left -= 1;
                return Some(position);
            }

            let frame = self.stack.pop()?;
            let HilbertFrame { x, y, ax, ay, bx, by } = frame;
            let w = ax.abs() + ay.abs();
            let h = bx.abs() + by.abs();
            let (dax, day) = (ax.signum(), ay.signum());
            let (dbx, dby) = (bx.signum(), by.signum());

            if h == 1 {
                self.run_x = x;
                self.run_y = y;
                self.run_dx = dax;
                self.run_dy = day;
                self.run_left = w;
                continue;
            }
            if w == 1 {
                self.run_x = x;
                self.run_y = y;
                self.run_dx = dbx;
                self.run_dy = dby;
                self.run_left = h;
                continue;
            }

            // Floor halving keeps the split direction for negative
            // basis vectors.
            let mut ax2 = ax.div_euclid(2);
            let mut ay2 = ay.div_euclid(2);
            let mut bx2 = bx.div_euclid(2);
            let mut by2 = by.div_euclid(2);
            let w2 = ax2.abs() + ay2.abs();
            let h2 = bx2.abs() + by2.abs();

            if 2 * w > 3 * h {
                if w2 % 2 != 0 && w > 2 {
                    ax2 += dax;
                    ay2 += day;
                }
                // Pushed in reverse so the pop order matches traversal.
                self.stack.push(HilbertFrame {
                    x: x + ax2,
                    y: y + ay2,
                    ax: ax - ax2,
                    ay: ay - ay2,
                    bx,
                    by,
                });
                self.stack.push(HilbertFrame {
                    x,
                    y,
                    ax: ax2,
                    ay: ay2,
                    bx,
                    by,
                });
            } else {
                if h2 % 2 != 0 && h > 2 {
                    bx2 += dbx;
                    by2 += dby;
                }
                self.stack.push(HilbertFrame {
                    x: x + (ax - dax) + (bx2 - dbx),
                    y: y + (ay - day) + (by2 - dby),
                    ax: -bx2,
                    ay: -by2,
                    bx: -(ax - ax2),
                    by: -(ay - ay2),
                });
                self.stack.push(HilbertFrame {
                    x: x + bx2,
                    y: y + by2,
                    ax,
                    ay,
                    bx: bx - bx2,
                    by: by - by2,
                });
                self.stack.push(HilbertFrame {
                    x,
                    y,
                    ax: bx2,
                    ay: by2,
                    bx: ax2,
                    by: ay2,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: [ScanOrder; 4] = [
        ScanOrder::Raster,
        ScanOrder::Snake,
        ScanOrder::Morton,
        ScanOrder::Hilbert,
    ];

    fn assert_covers_exactly_once(order: ScanOrder, width: u32, height: u32) {
        let mut seen = vec![false; (width * height) as usize];
        let mut count = 0usize;
        for (x, y) in scan_positions(order, width, height) {
            assert!(x < width && y < height, "{order:?} out of bounds at ({x},{y})");
            let index = (y * width + x) as usize;
            assert!(!seen[index], "{order:?} revisited ({x},{y}) in {width}x{height}");
            seen[index] = true;
            count += 1;
        }
        assert_eq!(
            count,
            (width * height) as usize,
            "{order:?} missed positions in {width}x{height}"
        );
    }

    #[test]
    fn test_coverage_all_orders() {
        let sizes = [
            (1, 1),
            (1, 7),
            (7, 1),
            (3, 5),
            (4, 4),
            (8, 8),
            (7, 3),
            (16, 15),
            (15, 16),
            (33, 9),
            (9, 33),
            (31, 17),
            (64, 64),
            (65, 2),
            (2, 65),
        ];
        for order in ORDERS {
            for (w, h) in sizes {
                assert_covers_exactly_once(order, w, h);
            }
        }
    }

    #[test]
    fn test_raster_order() {
        let positions: Vec<_> = scan_positions(ScanOrder::Raster, 3, 2).collect();
        assert_eq!(
            positions,
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
        );
    }

    #[test]
    fn test_snake_successive_positions_adjacent() {
        let sizes = [(8, 8), (16, 16), (33, 31), (12, 40), (40, 12), (5, 5), (64, 17)];
        for (w, h) in sizes {
            let positions: Vec<_> = scan_positions(ScanOrder::Snake, w, h).collect();
            for pair in positions.windows(2) {
                let (x0, y0) = pair[0];
                let (x1, y1) = pair[1];
                let distance = x0.abs_diff(x1) + y0.abs_diff(y1);
                assert_eq!(
                    distance, 1,
                    "snake jump from ({x0},{y0}) to ({x1},{y1}) in {w}x{h}"
                );
            }
        }
    }

    #[test]
    fn test_snake_tile_parity() {
        for w in 1..200 {
            let tw = snake_tile_width(w);
            assert_eq!(((w + tw - 1) / tw) % 2, 1, "even column grid for w={w}");
        }
        for h in 1..200 {
            let th = snake_tile_height(h);
            assert_eq!(th % 2, 1, "even tile height for h={h}");
            let rem = h % th;
            assert!(rem == 0 || rem % 2 == 1, "even remainder band for h={h}");
        }
    }

    #[test]
    fn test_morton_square_prefix() {
        let positions: Vec<_> = scan_positions(ScanOrder::Morton, 4, 4).collect();
        assert_eq!(
            &positions[..8],
            &[
                (0, 0),
                (1, 0),
                (0, 1),
                (1, 1),
                (2, 0),
                (3, 0),
                (2, 1),
                (3, 1)
            ]
        );
    }

    #[test]
    fn test_hilbert_starts_at_origin() {
        for (w, h) in [(8, 8), (13, 7), (7, 13)] {
            let first = scan_positions(ScanOrder::Hilbert, w, h).next().unwrap();
            assert_eq!(first, (0, 0));
        }
    }

    #[test]
    fn test_orders_are_deterministic() {
        for order in ORDERS {
            let a: Vec<_> = scan_positions(order, 19, 11).collect();
            let b: Vec<_> = scan_positions(order, 19, 11).collect();
            assert_eq!(a, b);
        }
    }
}
