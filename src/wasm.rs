//! JavaScript-facing surface.
//!
//! The browser host decodes nothing itself: it hands over the raw file
//! bytes plus slider values and gets back a PNG it can turn into a `Blob`,
//! the palette as hex strings, and the info line.

use js_sys::{Array, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

use crate::params::{BlockMode, Params};

/// Convert an encoded image to pixel art.
///
/// Returns `{ image: Uint8Array, palette: Array<string>, info: string }`.
/// The host names the download itself (`pixel-art-<timestamp>.png`).
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn pixelate(
    input: Vec<u8>,
    rotation_degrees: u32,
    block_size: u32,
    palette_size: usize,
    edge_threshold: u32,
    grid_line_width: u32,
    grayscale: bool,
    grid_lines: bool,
    edge_detection: bool,
    dominant_mode: bool,
) -> Result<Object, JsValue> {
    let params = Params {
        block_size,
        palette_size,
        edge_threshold,
        grid_line_width,
        grayscale,
        grid_lines,
        edge_detection,
        block_mode: if dominant_mode {
            BlockMode::Dominant
        } else {
            BlockMode::Average
        },
        confirmation_mode: false,
    };

    let (png, palette_hex, info) =
        crate::pixelate_bytes(&input, rotation_degrees, params, None)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let image_js = Uint8Array::from(png.as_slice());
    let palette_js = Array::new();
    for hex in palette_hex {
        palette_js.push(&JsValue::from_str(&hex));
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("image"), &image_js)?;
    Reflect::set(&result, &JsValue::from_str("palette"), &palette_js)?;
    Reflect::set(&result, &JsValue::from_str("info"), &JsValue::from_str(&info))?;
    Ok(result)
}
