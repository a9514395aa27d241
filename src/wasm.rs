//! Browser entry points.

use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;

use crate::batch;
use crate::encoder::JpegEncoderAdapter;
use crate::image_search;
use crate::pdf_search;
use crate::policy::ImageSearchPolicy;
use crate::request::CompressionRequest;
use crate::serializer::{CompressionLevel, LopdfSerializer};

#[wasm_bindgen]
pub fn compress_image_to_target(input: &[u8], target_kb: u32) -> Result<Vec<u8>, JsError> {
    let request = CompressionRequest::image(input, target_kb as u64)?;
    let result = image_search::search_image_quality(&JpegEncoderAdapter, &request)?;
    Ok(result.output_bytes.to_vec())
}

#[wasm_bindgen]
pub fn compress_image_auto(input: &[u8]) -> Result<Vec<u8>, JsError> {
    let result = image_search::compress_image_auto(&JpegEncoderAdapter, input)?;
    Ok(result.output_bytes.to_vec())
}

#[wasm_bindgen]
pub fn compress_pdf_to_target(input: &[u8], target_kb: u32) -> Result<Vec<u8>, JsError> {
    let request = CompressionRequest::pdf(input, target_kb as u64)?;
    let result = pdf_search::search_pdf_quality(&LopdfSerializer, &request)?;
    Ok(result.output_bytes.to_vec())
}

#[wasm_bindgen]
pub fn compress_pdf_with_level(input: &[u8], level: &str) -> Result<Vec<u8>, JsError> {
    let level: CompressionLevel = level
        .parse()
        .map_err(|e: anyhow::Error| JsError::new(&e.to_string()))?;
    let result = pdf_search::compress_pdf_with_level(&LopdfSerializer, input, level)?;
    Ok(result.output_bytes.to_vec())
}

/// Compresses every `Uint8Array` in `inputs`. Failed slots come back as
/// `null` and are reported on the console.
#[wasm_bindgen]
pub fn compress_images_to_target(inputs: Array, target_kb: u32) -> Array {
    let items = inputs
        .iter()
        .map(|value| CompressionRequest::image(Uint8Array::new(&value).to_vec(), target_kb as u64))
        .collect();

    let result = batch::compress_images(&JpegEncoderAdapter, items, &ImageSearchPolicy::default());

    result
        .items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Ok(trial) => JsValue::from(Uint8Array::from(&trial.output_bytes[..])),
            Err(e) => {
                web_sys::console::warn_1(&format!("Failed to compress image {}: {}", index, e).into());
                JsValue::NULL
            }
        })
        .collect()
}
