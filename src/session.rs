//! One editing session: rotated source, extracted palette, working buffer,
//! and the interactive editor state.
//!
//! The session owns every buffer it hands out internally; `recompute` is an
//! idempotent quantize -> edges -> grid pass from the stored rotated source
//! and palette, so the host can mutate parameters and call it again without
//! hidden ordering effects. Palette extraction (the only randomized step)
//! happens at load and when the palette size or rotation changes, with the
//! caller-injected random source.

use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;
use log::{debug, info};
use rand::Rng;

use crate::buffer::PixelBuffer;
use crate::color::Rgb;
use crate::combine;
use crate::editor::{PaletteEditor, PickOutcome};
use crate::edges;
use crate::error::Result;
use crate::grid;
use crate::palette::{self, Palette};
use crate::params::{Params, Rotation};
use crate::quantize;

pub struct Session {
    /// Unrotated source, kept so rotation changes can re-derive the working
    /// orientation without a reload.
    original: PixelBuffer,
    /// Source after rotation; every pipeline pass starts here.
    source: PixelBuffer,
    rotation: Rotation,
    params: Params,
    palette: Palette,
    working: PixelBuffer,
    editor: PaletteEditor,
    /// Distinct RGB triples in the rotated source, for the summary line.
    unique_colors: usize,
}

impl Session {
    /// Load a decoded image and run the initial conversion.
    pub fn new<R: Rng>(
        image: RgbaImage,
        rotation: Rotation,
        params: Params,
        rng: &mut R,
    ) -> Result<Self> {
        params.validate()?;
        let original = PixelBuffer::from_image(image)?;
        let source = rotate_buffer(&original, rotation);
        let unique_colors = source.unique_color_count();
        info!(
            "session: {}x{} source, rotation {}, {unique_colors} distinct colors",
            original.width(),
            original.height(),
            rotation.degrees()
        );

        let palette = palette::extract_palette(&source, params.palette_size, rng)?;
        let working = run_pipeline(&source, &palette, &params)?;
        Ok(Session {
            original,
            source,
            rotation,
            params,
            palette,
            working,
            editor: PaletteEditor::new(params.confirmation_mode),
            unique_colors,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn working(&self) -> &PixelBuffer {
        &self.working
    }

    pub fn editor(&self) -> &PaletteEditor {
        &self.editor
    }

    pub fn unique_color_count(&self) -> usize {
        self.unique_colors
    }

    /// Re-run quantize -> edges -> grid from the rotated source, replacing
    /// the working buffer. Editor bookkeeping (the replaced set) is left
    /// alone; `reset_editor` clears it.
    pub fn recompute(&mut self) -> Result<&PixelBuffer> {
        self.working = run_pipeline(&self.source, &self.palette, &self.params)?;
        Ok(&self.working)
    }

    /// Update parameters. Re-extracts the palette only when the palette
    /// size changed (extraction is the randomized step), then recomputes.
    pub fn set_params<R: Rng>(&mut self, params: Params, rng: &mut R) -> Result<()> {
        params.validate()?;
        let palette_changed = params.palette_size != self.params.palette_size;
        self.params = params;
        self.editor.set_confirmation_mode(params.confirmation_mode);
        if palette_changed {
            self.palette = palette::extract_palette(&self.source, params.palette_size, rng)?;
        }
        self.recompute()?;
        Ok(())
    }

    /// Reorient the source. A new palette is extracted (sampling order
    /// changes with orientation) and the pipeline reruns.
    pub fn set_rotation<R: Rng>(&mut self, rotation: Rotation, rng: &mut R) -> Result<()> {
        self.rotation = rotation;
        self.source = rotate_buffer(&self.original, rotation);
        self.unique_colors = self.source.unique_color_count();
        self.palette = palette::extract_palette(&self.source, self.params.palette_size, rng)?;
        self.recompute()?;
        Ok(())
    }

    // Editor passthroughs; the session owns both the editor and the
    // working buffer the editor mutates.

    pub fn select_replacement_color(&mut self, color: Rgb) -> bool {
        self.editor.select_replacement_color(color)
    }

    pub fn pick_target_pixel(&mut self, x: u32, y: u32) -> Result<PickOutcome> {
        self.editor.pick_target_pixel(&mut self.working, x, y)
    }

    pub fn confirm_pending(&mut self) -> bool {
        self.editor.confirm_pending(&mut self.working)
    }

    pub fn cancel_selection(&mut self) {
        self.editor.cancel()
    }

    pub fn toggle_highlight(&mut self) -> bool {
        self.editor.toggle_highlight()
    }

    /// Display-only highlight view; `None` when no highlight is active.
    pub fn highlight_view(&self) -> Result<Option<PixelBuffer>> {
        self.editor
            .highlight_overlay(&self.working, self.params.block_size)
    }

    /// Clear the editing session (replaced set, pending state). The working
    /// buffer keeps any substitutions until the next `recompute`.
    pub fn reset_editor(&mut self) {
        self.editor.reset();
    }

    /// Merge near-duplicate palette colors and remap the working buffer.
    pub fn smart_combine(&mut self) {
        let (palette, working) = combine::smart_combine(&self.palette, &self.working);
        debug!(
            "smart combine: {} -> {} palette colors",
            self.palette.len(),
            palette.len()
        );
        self.palette = palette;
        self.working = working;
    }

    /// Human-readable conversion summary.
    pub fn summary(&self) -> String {
        format!(
            "Original: {}x{}px | Rotated: {}x{}px (Rotation: {}°) | Unique Colors: {} | Pixel Art: {}x{}px",
            self.original.width(),
            self.original.height(),
            self.source.width(),
            self.source.height(),
            self.rotation.degrees(),
            self.unique_colors,
            self.working.width(),
            self.working.height(),
        )
    }

    /// PNG-encode the current working buffer for download.
    pub fn export_png(&self) -> Result<Vec<u8>> {
        self.working.to_png()
    }

    /// Download file name: `pixel-art-<timestamp>.png`.
    pub fn export_file_name() -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        format!("pixel-art-{millis}.png")
    }
}

fn rotate_buffer(buffer: &PixelBuffer, rotation: Rotation) -> PixelBuffer {
    let rotated = rotation.apply(&buffer.to_image());
    PixelBuffer::from_image(rotated).expect("rotation preserves pixel count")
}

fn run_pipeline(source: &PixelBuffer, palette: &Palette, params: &Params) -> Result<PixelBuffer> {
    let mut buffer = quantize::pixelate(
        source,
        palette,
        params.block_size,
        params.block_mode,
        params.grayscale,
    )?;
    if params.edge_detection {
        buffer = edges::detect_edges(&buffer, params.edge_threshold);
    }
    if params.grid_lines {
        buffer = grid::draw_grid(&buffer, params.block_size, params.grid_line_width);
    }
    Ok(buffer)
}
