//! WebAssembly bindings for sqz-rs.
//!
//! Thin wasm-bindgen wrappers over the encoder and decoder for use in
//! browsers and Node.js.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use crate::{ColorMode, ScanOrder, SqzDecoder, SqzDescriptor, SqzEncoder};

/// Image information returned from the WASM API.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct SqzInfo {
    pub width: u32,
    pub height: u32,
    pub planes: u32,
    pub color_mode: u8,
    pub dwt_levels: u8,
    pub scan_order: u8,
}

/// Encodes packed grayscale or RGB pixels into an SQZ stream capped at
/// `budget` bytes.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn encode_sqz(
    pixels: &[u8],
    width: u32,
    height: u32,
    color_mode: u8,
    dwt_levels: u8,
    scan_order: u8,
    subsampling: bool,
    budget: usize,
) -> Result<Vec<u8>, JsValue> {
    let descriptor = SqzDescriptor {
        width,
        height,
        color_mode: ColorMode::try_from(color_mode)
            .map_err(|_| JsValue::from_str("bad color mode"))?,
        dwt_levels,
        scan_order: ScanOrder::try_from(scan_order)
            .map_err(|_| JsValue::from_str("bad scan order"))?,
        subsampling,
    };

    let mut stream = vec![0u8; budget];
    let mut encoder = SqzEncoder::new(&mut stream);
    encoder
        .set_descriptor(descriptor)
        .map_err(|e| JsValue::from_str(&format!("Descriptor error: {:?}", e)))?;
    let written = encoder
        .encode(pixels)
        .map_err(|e| JsValue::from_str(&format!("Encode error: {:?}", e)))?;
    stream.truncate(written);
    Ok(stream)
}

/// Decodes an SQZ stream (or any prefix of one) to packed pixels.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn decode_sqz(data: &[u8]) -> Result<Vec<u8>, JsValue> {
    let mut decoder = SqzDecoder::new(data);
    let size = decoder
        .destination_size()
        .map_err(|e| JsValue::from_str(&format!("Header error: {:?}", e)))?;
    let mut pixels = vec![0u8; size];
    decoder
        .decode(&mut pixels)
        .map_err(|e| JsValue::from_str(&format!("Decode error: {:?}", e)))?;
    Ok(pixels)
}

/// Header information without a full decode.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn get_sqz_info(data: &[u8]) -> Result<SqzInfo, JsValue> {
    let mut decoder = SqzDecoder::new(data);
    decoder
        .read_header()
        .map_err(|e| JsValue::from_str(&format!("Header error: {:?}", e)))?;
    let descriptor = decoder
        .descriptor()
        .ok_or_else(|| JsValue::from_str("missing descriptor"))?;
    Ok(SqzInfo {
        width: descriptor.width,
        height: descriptor.height,
        planes: descriptor.plane_count() as u32,
        color_mode: descriptor.color_mode as u8,
        dwt_levels: descriptor.dwt_levels,
        scan_order: descriptor.scan_order as u8,
    })
}
