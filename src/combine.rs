//! Smart combine: post-hoc merge of near-duplicate palette colors.
//!
//! A deliberately greedy single pass over the palette in its existing
//! (luminance) order: each not-yet-merged color absorbs every remaining
//! color within the similarity threshold, and the group is emitted as its
//! rounded channel average. First-color-wins grouping is part of the
//! contract; it keeps repeated runs reproducible even though it is not a
//! globally optimal clustering.

use std::collections::HashMap;

use log::debug;

use crate::buffer::PixelBuffer;
use crate::color::Rgb;
use crate::palette::Palette;

/// 5% of 255 per channel, scaled for 3-channel Euclidean distance (38.25).
pub const SIMILARITY_THRESHOLD: f64 = 0.05 * 255.0 * 3.0;

/// Merge similar palette colors and remap the working buffer accordingly.
/// The combined palette is never longer than the input; remapping only
/// touches pixels whose exact color belonged to a merged group.
pub fn smart_combine(palette: &Palette, buffer: &PixelBuffer) -> (Palette, PixelBuffer) {
    let (combined, mapping) = combine_palette(palette, SIMILARITY_THRESHOLD);
    let remapped = remap(buffer, &mapping);
    (combined, remapped)
}

/// Greedy grouping pass. Returns the combined palette and the exact
/// old-color -> combined-color mapping used to remap the buffer.
pub(crate) fn combine_palette(palette: &Palette, threshold: f64) -> (Palette, HashMap<Rgb, Rgb>) {
    let colors = palette.colors();
    let mut merged = vec![false; colors.len()];
    let mut combined = Vec::new();
    let mut mapping = HashMap::new();

    for i in 0..colors.len() {
        if merged[i] {
            continue;
        }
        merged[i] = true;
        let mut group = vec![colors[i]];
        for j in (i + 1)..colors.len() {
            if !merged[j] && colors[i].distance(colors[j]) <= threshold {
                merged[j] = true;
                group.push(colors[j]);
            }
        }

        let n = group.len() as f64;
        let avg = Rgb::new(
            (group.iter().map(|c| c.r as f64).sum::<f64>() / n).round() as u8,
            (group.iter().map(|c| c.g as f64).sum::<f64>() / n).round() as u8,
            (group.iter().map(|c| c.b as f64).sum::<f64>() / n).round() as u8,
        );
        for member in &group {
            mapping.insert(*member, avg);
        }
        combined.push(avg);
    }

    if combined.len() < colors.len() {
        debug!(
            "smart combine reduced palette from {} to {} colors",
            colors.len(),
            combined.len()
        );
    }
    // Palette::new restores the luminance ordering invariant; the grouping
    // above already ran over the pre-merge order.
    (Palette::new(combined), mapping)
}

fn remap(buffer: &PixelBuffer, mapping: &HashMap<Rgb, Rgb>) -> PixelBuffer {
    let mut out = buffer.clone();
    for px in out.data_mut().chunks_exact_mut(4) {
        let color = Rgb::new(px[0], px[1], px[2]);
        if let Some(&replacement) = mapping.get(&color) {
            px[0] = replacement.r;
            px[1] = replacement.g;
            px[2] = replacement.b;
        }
    }
    out
}
