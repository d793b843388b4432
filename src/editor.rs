//! Interactive palette-driven recoloring.
//!
//! A small state machine: `Idle` until a replacement color is chosen from
//! the palette (`SourceSelected`), back to `Idle` once a substitution
//! completes or is canceled. Substitution rewrites exact color matches
//! only, and every substituted-out color lands in the replaced set so it
//! can never be picked as source or target again within the session.
//!
//! Invalid selections (replaced color, target equal to the pending
//! replacement) are silent no-ops by contract: the host simply re-renders
//! unchanged state. Out-of-range pixel coordinates are real errors.

use std::collections::HashSet;

use log::debug;

use crate::buffer::PixelBuffer;
use crate::color::Rgb;
use crate::error::Result;
use crate::quantize::BlockGrid;

/// Factor applied to non-highlighted pixels in the highlight overlay.
const DIM_FACTOR: f64 = 0.3;
/// Border thickness drawn around blocks whose center matches the highlight.
const HIGHLIGHT_BORDER: u32 = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Idle,
    SourceSelected,
}

/// A substitution awaiting external approval in confirmation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingSubstitution {
    pub old_color: Rgb,
    pub new_color: Rgb,
}

/// Outcome of a target-pixel pick, so the host knows what to re-render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickOutcome {
    /// Invalid selection; nothing changed.
    Ignored,
    /// The substitution was applied to the working buffer.
    Substituted,
    /// Confirmation mode: the substitution is recorded but not yet applied.
    AwaitingConfirmation(PendingSubstitution),
}

#[derive(Clone, Debug, Default)]
pub struct PaletteEditor {
    state: EditorState,
    pending_replacement: Option<Rgb>,
    pending_confirmation: Option<PendingSubstitution>,
    replaced: HashSet<Rgb>,
    highlight_enabled: bool,
    confirmation_mode: bool,
}

impl PaletteEditor {
    pub fn new(confirmation_mode: bool) -> Self {
        PaletteEditor {
            confirmation_mode,
            ..PaletteEditor::default()
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn pending_replacement(&self) -> Option<Rgb> {
        self.pending_replacement
    }

    pub fn pending_confirmation(&self) -> Option<PendingSubstitution> {
        self.pending_confirmation
    }

    pub fn replaced(&self) -> &HashSet<Rgb> {
        &self.replaced
    }

    pub fn is_replaced(&self, color: Rgb) -> bool {
        self.replaced.contains(&color)
    }

    pub fn set_confirmation_mode(&mut self, enabled: bool) {
        self.confirmation_mode = enabled;
    }

    /// Choose the palette color that will be painted over the next target.
    /// Silently ignored if the color was already substituted out. On
    /// success the color also becomes the highlight target for immediate
    /// visual feedback.
    pub fn select_replacement_color(&mut self, color: Rgb) -> bool {
        if self.replaced.contains(&color) {
            return false;
        }
        self.state = EditorState::SourceSelected;
        self.pending_replacement = Some(color);
        self.highlight_enabled = true;
        true
    }

    /// Pick the pixel whose color should be replaced. Only meaningful in
    /// `SourceSelected`; reads the exact color at (x, y) from the working
    /// buffer. Out-of-bounds coordinates are an error; a replaced or
    /// self-referential target is a silent no-op.
    pub fn pick_target_pixel(
        &mut self,
        buffer: &mut PixelBuffer,
        x: u32,
        y: u32,
    ) -> Result<PickOutcome> {
        let old_color = buffer.get(x, y)?;
        let Some(new_color) = self.pending_replacement else {
            return Ok(PickOutcome::Ignored);
        };
        if self.state != EditorState::SourceSelected
            || self.replaced.contains(&old_color)
            || old_color == new_color
        {
            return Ok(PickOutcome::Ignored);
        }

        if self.confirmation_mode {
            let pending = PendingSubstitution {
                old_color,
                new_color,
            };
            self.pending_confirmation = Some(pending);
            Ok(PickOutcome::AwaitingConfirmation(pending))
        } else {
            self.perform_substitution(buffer, old_color, new_color);
            Ok(PickOutcome::Substituted)
        }
    }

    /// Apply a pending confirmation-mode substitution. Returns false when
    /// nothing was pending.
    pub fn confirm_pending(&mut self, buffer: &mut PixelBuffer) -> bool {
        match self.pending_confirmation.take() {
            Some(pending) => {
                self.perform_substitution(buffer, pending.old_color, pending.new_color);
                true
            }
            None => false,
        }
    }

    /// Drop any pending selection/confirmation without touching the buffer.
    pub fn cancel(&mut self) {
        self.state = EditorState::Idle;
        self.pending_replacement = None;
        self.pending_confirmation = None;
        self.highlight_enabled = false;
    }

    /// Rewrite every exact `old_color` pixel to `new_color`, record the old
    /// color as replaced, and return to `Idle`.
    pub fn perform_substitution(
        &mut self,
        buffer: &mut PixelBuffer,
        old_color: Rgb,
        new_color: Rgb,
    ) {
        let touched = buffer.replace_exact(old_color, new_color);
        debug!(
            "substituted {} -> {} across {touched} pixels",
            old_color.to_hex(),
            new_color.to_hex()
        );
        self.replaced.insert(old_color);
        self.state = EditorState::Idle;
        self.pending_replacement = None;
        self.pending_confirmation = None;
        self.highlight_enabled = false;
    }

    /// Toggle the display-only highlight overlay. Returns the new state.
    pub fn toggle_highlight(&mut self) -> bool {
        if self.pending_replacement.is_some() {
            self.highlight_enabled = !self.highlight_enabled;
        }
        self.highlight_enabled
    }

    pub fn highlight_enabled(&self) -> bool {
        self.highlight_enabled
    }

    /// Render the highlight overlay for the current pending color: a
    /// derived copy of the working buffer where non-matching pixels are
    /// dimmed to 30% and each block whose center pixel matches gets a 2px
    /// black border. The working buffer itself is never mutated.
    pub fn highlight_overlay(
        &self,
        buffer: &PixelBuffer,
        block_size: u32,
    ) -> Result<Option<PixelBuffer>> {
        if !self.highlight_enabled {
            return Ok(None);
        }
        let Some(target) = self.pending_replacement else {
            return Ok(None);
        };

        let mut overlay = buffer.clone();
        for y in 0..overlay.height() {
            for x in 0..overlay.width() {
                let px = overlay.get_unchecked(x, y);
                if px != target {
                    overlay.set_unchecked(x, y, px.scaled(DIM_FACTOR));
                }
            }
        }

        let grid = BlockGrid::new(buffer.width(), buffer.height(), block_size)?;
        for block in grid.blocks() {
            let (cx, cy) = block.center();
            if buffer.get_unchecked(cx, cy) != target {
                continue;
            }
            for (x, y) in block.pixels() {
                let on_border = x < block.x0 + HIGHLIGHT_BORDER
                    || x >= block.x1.saturating_sub(HIGHLIGHT_BORDER)
                    || y < block.y0 + HIGHLIGHT_BORDER
                    || y >= block.y1.saturating_sub(HIGHLIGHT_BORDER);
                if on_border {
                    overlay.set_unchecked(x, y, Rgb::BLACK);
                }
            }
        }
        Ok(Some(overlay))
    }

    /// Clear all editing session state. Does not re-run quantization; the
    /// caller re-invokes the quantizer to restore pristine pixelation.
    pub fn reset(&mut self) {
        self.state = EditorState::Idle;
        self.pending_replacement = None;
        self.pending_confirmation = None;
        self.replaced.clear();
        self.highlight_enabled = false;
    }
}
