//! Pixel-art conversion core: block quantization, k-means palette
//! extraction, Sobel edge overlays, grid lines, and interactive
//! palette-driven recoloring over in-memory RGBA buffers.
//!
//! The crate is a pure, synchronous transformation engine: the host (web UI
//! through the wasm bindings, or the native CLI) supplies decoded pixel data
//! and parameter values and gets new buffers and palettes back. No stage
//! mutates a buffer the caller may still be rendering.

pub mod buffer;
pub mod color;
pub mod combine;
pub mod editor;
pub mod edges;
pub mod error;
pub mod grid;
pub mod palette;
pub mod params;
pub mod quantize;
pub mod session;
pub mod wasm;

pub use buffer::PixelBuffer;
pub use color::Rgb;
pub use editor::{EditorState, PaletteEditor, PendingSubstitution, PickOutcome};
pub use error::{Error, Result};
pub use palette::Palette;
pub use params::{BlockMode, Params, Rotation};
pub use session::Session;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// One-shot conversion over encoded image bytes: decode, rotate, extract a
/// palette, quantize, overlay, and PNG-encode. Returns the PNG bytes, the
/// palette as `RRGGBB` hex strings in display order, and the summary line.
///
/// `seed` pins the k-means++ seeding for reproducible output; `None` draws
/// from system entropy.
pub fn pixelate_bytes(
    input: &[u8],
    rotation_degrees: u32,
    params: Params,
    seed: Option<u64>,
) -> Result<(Vec<u8>, Vec<String>, String)> {
    let image = image::load_from_memory(input)?.to_rgba8();
    let rotation = Rotation::from_degrees(rotation_degrees)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let session = Session::new(image, rotation, params, &mut rng)?;
    let png = session.export_png()?;
    let palette_hex = session
        .palette()
        .colors()
        .iter()
        .map(|c| c.to_hex())
        .collect();
    Ok((png, palette_hex, session.summary()))
}
