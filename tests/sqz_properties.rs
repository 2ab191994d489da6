// Quantified codec properties: losslessness, prefix validity,
// monotone quality, determinism.

use sqz_rs::{ColorMode, ScanOrder, SqzDecoder, SqzDescriptor, SqzEncoder};

const SCANS: [ScanOrder; 4] = [
    ScanOrder::Raster,
    ScanOrder::Snake,
    ScanOrder::Morton,
    ScanOrder::Hilbert,
];

fn encode(descriptor: SqzDescriptor, pixels: &[u8], budget: usize) -> Vec<u8> {
    let mut stream = vec![0u8; budget];
    let mut encoder = SqzEncoder::new(&mut stream);
    encoder.set_descriptor(descriptor).unwrap();
    let written = encoder.encode(pixels).unwrap();
    stream.truncate(written);
    stream
}

fn decode(stream: &[u8]) -> Vec<u8> {
    let mut decoder = SqzDecoder::new(stream);
    let size = decoder.destination_size().unwrap();
    let mut pixels = vec![0u8; size];
    decoder.decode(&mut pixels).unwrap();
    pixels
}

fn gradient_rgb(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / width.max(1)) as u8);
            pixels.push((y * 255 / height.max(1)) as u8);
            pixels.push(((x + y) * 127 / (width + height)) as u8);
        }
    }
    pixels
}

fn noise(len: usize, mut seed: u64) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed >> 56) as u8
        })
        .collect()
}

fn sum_squared_error(a: &[u8], b: &[u8]) -> u64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as i64 - y as i64;
            (d * d) as u64
        })
        .sum()
}

#[test]
fn lossless_grayscale_across_scan_orders() {
    for scan in SCANS {
        for (width, height, levels) in [(8u32, 8u32, 1u8), (16, 16, 1), (32, 24, 2), (48, 48, 2)] {
            let descriptor = SqzDescriptor {
                width,
                height,
                color_mode: ColorMode::Grayscale,
                dwt_levels: levels,
                scan_order: scan,
                subsampling: false,
            };
            let pixels = noise((width * height) as usize, width as u64 * 31 + height as u64);
            let budget = pixels.len() * 4 + 256;
            let stream = encode(descriptor, &pixels, budget);
            assert_eq!(
                decode(&stream),
                pixels,
                "lossless failure at {width}x{height} {scan:?}"
            );
        }
    }
}

#[test]
fn lossless_ycocg_across_scan_orders() {
    for scan in SCANS {
        let descriptor = SqzDescriptor {
            width: 32,
            height: 32,
            color_mode: ColorMode::YCoCgR,
            dwt_levels: 2,
            scan_order: scan,
            subsampling: false,
        };
        let pixels = noise(32 * 32 * 3, 0xDEADBEEF);
        let stream = encode(descriptor, &pixels, pixels.len() * 4 + 256);
        assert_eq!(decode(&stream), pixels, "lossless failure for {scan:?}");
    }
}

#[test]
fn lossless_with_subsampling_lag() {
    let descriptor = SqzDescriptor {
        width: 24,
        height: 24,
        color_mode: ColorMode::YCoCgR,
        dwt_levels: 1,
        scan_order: ScanOrder::Snake,
        subsampling: true,
    };
    let pixels = gradient_rgb(24, 24);
    let stream = encode(descriptor, &pixels, pixels.len() * 4 + 256);
    assert_eq!(decode(&stream), pixels);
}

#[test]
fn lossy_modes_reconstruct_close_at_full_budget() {
    for mode in [ColorMode::Oklab, ColorMode::Logl1] {
        let descriptor = SqzDescriptor {
            width: 32,
            height: 32,
            color_mode: mode,
            dwt_levels: 2,
            scan_order: ScanOrder::Hilbert,
            subsampling: false,
        };
        let pixels = gradient_rgb(32, 32);
        let stream = encode(descriptor, &pixels, pixels.len() * 4 + 256);
        let decoded = decode(&stream);
        let total: u64 = pixels
            .iter()
            .zip(&decoded)
            .map(|(&a, &b)| (a as i64 - b as i64).unsigned_abs())
            .sum();
        // Lossy color transforms but a full coding budget: only the
        // transform error remains (mean well under 8 per channel).
        assert!(
            total <= 8 * pixels.len() as u64,
            "{mode:?} drifted too far: {total}"
        );
    }
}

#[test]
fn every_prefix_is_a_valid_stream() {
    let descriptor = SqzDescriptor {
        width: 24,
        height: 16,
        color_mode: ColorMode::YCoCgR,
        dwt_levels: 1,
        scan_order: ScanOrder::Hilbert,
        subsampling: false,
    };
    let pixels = gradient_rgb(24, 16);
    let stream = encode(descriptor, &pixels, pixels.len() * 4 + 256);

    for take in 6..=stream.len() {
        let mut decoder = SqzDecoder::new(&stream[..take]);
        let size = decoder.destination_size().expect("prefix header");
        assert_eq!(size, pixels.len());
        let mut out = vec![0u8; size];
        decoder.decode(&mut out).expect("prefix decode");
        let parsed = decoder.descriptor().unwrap();
        assert_eq!((parsed.width, parsed.height), (24, 16), "prefix {take}");
    }
}

#[test]
fn quality_is_monotone_across_budgets() {
    let descriptor = SqzDescriptor {
        width: 32,
        height: 32,
        color_mode: ColorMode::Grayscale,
        dwt_levels: 2,
        scan_order: ScanOrder::Snake,
        subsampling: false,
    };
    let mut pixels = vec![0u8; 32 * 32];
    for y in 0..32usize {
        for x in 0..32usize {
            pixels[y * 32 + x] = ((x * 8).min(255) as u8) / 2 + (y * 4) as u8;
        }
    }
    let stream = encode(descriptor, &pixels, pixels.len() * 4 + 256);

    let mut previous = u64::MAX;
    for budget in [16usize, 64, 256, stream.len()] {
        let budget = budget.min(stream.len());
        let decoded = decode(&stream[..budget]);
        let mse = sum_squared_error(&pixels, &decoded);
        assert!(
            mse <= previous,
            "quality regressed at budget {budget}: {mse} > {previous}"
        );
        previous = mse;
    }
    assert_eq!(previous, 0, "full stream must be lossless");
}

#[test]
fn encoding_is_deterministic() {
    for scan in SCANS {
        let descriptor = SqzDescriptor {
            width: 32,
            height: 24,
            color_mode: ColorMode::Oklab,
            dwt_levels: 1,
            scan_order: scan,
            subsampling: false,
        };
        let pixels = gradient_rgb(32, 24);
        let first = encode(descriptor, &pixels, pixels.len() * 2);
        let second = encode(descriptor, &pixels, pixels.len() * 2);
        assert_eq!(first, second, "nondeterministic stream for {scan:?}");
    }
}

#[test]
fn truncated_streams_never_panic() {
    let descriptor = SqzDescriptor {
        width: 16,
        height: 16,
        color_mode: ColorMode::Logl1,
        dwt_levels: 1,
        scan_order: ScanOrder::Morton,
        subsampling: true,
    };
    let pixels = noise(16 * 16 * 3, 7);
    let stream = encode(descriptor, &pixels, pixels.len() * 4 + 256);

    for take in 0..stream.len().min(64) {
        let mut decoder = SqzDecoder::new(&stream[..take]);
        let mut out = vec![0u8; pixels.len()];
        if take < 6 {
            assert!(decoder.decode(&mut out).is_err());
        } else {
            decoder.decode(&mut out).unwrap();
        }
    }
}
