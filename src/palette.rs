//! Palette extraction: k-means clustering over a deterministic pixel sample.
//!
//! The only randomized step is k-means++ centroid seeding, so the random
//! source is injected (`rand::Rng`): production callers pass an
//! entropy-seeded `StdRng`, tests pass `StdRng::seed_from_u64` for exact
//! reproducibility. Everything after seeding is deterministic, including
//! tie-breaks (nearest-centroid ties go to the earlier centroid, nearest-
//! palette-color ties to the earlier palette entry).

use std::collections::HashSet;

use log::debug;
use rand::Rng;

use crate::buffer::PixelBuffer;
use crate::color::Rgb;
use crate::error::{Error, Result};

pub const PALETTE_SIZE_MIN: usize = 4;
pub const PALETTE_SIZE_MAX: usize = 32;

/// Sample every 2nd pixel in scan order; uniform and deterministic so that
/// repeated extractions see the same input set.
const SAMPLE_STRIDE: usize = 2;

/// Lloyd iteration cap and the movement threshold below which we stop early.
const MAX_ITERATIONS: usize = 20;
const CONVERGENCE_DISTANCE: f64 = 1.0;

pub fn validate_palette_size(size: usize) -> Result<()> {
    if !(PALETTE_SIZE_MIN..=PALETTE_SIZE_MAX).contains(&size) || size % 2 != 0 {
        return Err(Error::InvalidInput(format!(
            "palette size must be even and in [{PALETTE_SIZE_MIN}, {PALETTE_SIZE_MAX}], got {size}"
        )));
    }
    Ok(())
}

/// An ordered set of representative colors, sorted descending by luminance.
/// The position defines the user-facing color number (1-indexed), so the
/// lightest color is always color 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Build a palette from arbitrary colors: drops exact duplicates
    /// (keeping first occurrence) and restores the luminance sort.
    pub fn new(colors: Vec<Rgb>) -> Self {
        let mut seen = HashSet::new();
        let mut colors: Vec<Rgb> = colors.into_iter().filter(|c| seen.insert(*c)).collect();
        colors.sort_by(|a, b| b.luminance().total_cmp(&a.luminance()));
        Palette { colors }
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Returned length is how callers observe degenerate-clustering clamps.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn contains(&self, color: Rgb) -> bool {
        self.colors.contains(&color)
    }

    /// (1-indexed display number, color) pairs.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, Rgb)> + '_ {
        self.colors.iter().copied().enumerate().map(|(i, c)| (i + 1, c))
    }

    /// Nearest palette entry to a (possibly fractional) representative
    /// color. Ties resolve to the first entry in palette order, i.e. the
    /// lightest of the tied colors.
    pub fn nearest(&self, r: f64, g: f64, b: f64) -> Rgb {
        debug_assert!(!self.colors.is_empty(), "palette must not be empty");
        let mut best = self.colors[0];
        let mut best_dist = f64::INFINITY;
        for &c in &self.colors {
            let dr = r - c.r as f64;
            let dg = g - c.g as f64;
            let db = b - c.b as f64;
            let dist = dr * dr + dg * dg + db * db;
            if dist < best_dist {
                best_dist = dist;
                best = c;
            }
        }
        best
    }

    pub fn nearest_color(&self, color: Rgb) -> Rgb {
        self.nearest(color.r as f64, color.g as f64, color.b as f64)
    }
}

/// Extract `size` representative colors from the buffer.
///
/// If the sample holds fewer distinct colors than `size`, the palette is
/// clamped to the distinct count (degenerate input, not an error); callers
/// see the shorter result via [`Palette::len`].
pub fn extract_palette<R: Rng>(
    buffer: &PixelBuffer,
    size: usize,
    rng: &mut R,
) -> Result<Palette> {
    validate_palette_size(size)?;

    let samples: Vec<Rgb> = buffer.pixels().step_by(SAMPLE_STRIDE).collect();
    debug_assert!(!samples.is_empty(), "validated buffer always yields samples");

    let distinct = samples.iter().collect::<HashSet<_>>().len();
    let k = size.min(distinct);
    if k < size {
        debug!("palette clamped from {size} to {k}: only {distinct} distinct samples");
    }

    let mut centroids = seed_centroids(&samples, k, rng);

    for iteration in 0..MAX_ITERATIONS {
        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];

        for &px in &samples {
            let cluster = nearest_centroid(&centroids, px);
            sums[cluster][0] += px.r as f64;
            sums[cluster][1] += px.g as f64;
            sums[cluster][2] += px.b as f64;
            counts[cluster] += 1;
        }

        let mut max_shift = 0.0f64;
        for i in 0..k {
            if counts[i] == 0 {
                // Empty cluster keeps its previous centroid.
                continue;
            }
            let n = counts[i] as f64;
            let next = [sums[i][0] / n, sums[i][1] / n, sums[i][2] / n];
            let shift = squared(next[0] - centroids[i][0])
                + squared(next[1] - centroids[i][1])
                + squared(next[2] - centroids[i][2]);
            max_shift = max_shift.max(shift.sqrt());
            centroids[i] = next;
        }

        if max_shift <= CONVERGENCE_DISTANCE {
            debug!("k-means converged after {} iterations", iteration + 1);
            break;
        }
    }

    let rounded: Vec<Rgb> = centroids
        .iter()
        .map(|c| {
            Rgb::new(
                c[0].round() as u8,
                c[1].round() as u8,
                c[2].round() as u8,
            )
        })
        .collect();

    Ok(Palette::new(rounded))
}

#[inline]
fn squared(v: f64) -> f64 {
    v * v
}

/// Index of the nearest centroid; ties go to the earliest centroid.
fn nearest_centroid(centroids: &[[f64; 3]], px: Rgb) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let dist = squared(px.r as f64 - c[0])
            + squared(px.g as f64 - c[1])
            + squared(px.b as f64 - c[2]);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

/// k-means++: first centroid drawn uniformly, each further centroid drawn
/// with probability proportional to its squared distance from the nearest
/// already-chosen centroid.
fn seed_centroids<R: Rng>(samples: &[Rgb], k: usize, rng: &mut R) -> Vec<[f64; 3]> {
    let mut centroids: Vec<[f64; 3]> = Vec::with_capacity(k);
    let first = samples[rng.random_range(0..samples.len())];
    centroids.push([first.r as f64, first.g as f64, first.b as f64]);

    let mut weights = vec![0.0f64; samples.len()];
    while centroids.len() < k {
        let mut total = 0.0;
        for (i, &px) in samples.iter().enumerate() {
            let nearest = nearest_centroid(&centroids, px);
            let c = centroids[nearest];
            let d = squared(px.r as f64 - c[0])
                + squared(px.g as f64 - c[1])
                + squared(px.b as f64 - c[2]);
            weights[i] = d;
            total += d;
        }

        let chosen = if total == 0.0 {
            // All remaining samples coincide with a centroid; fall back to a
            // uniform draw (k is already clamped to the distinct count, so
            // this only happens on pathological inputs).
            rng.random_range(0..samples.len())
        } else {
            let mut target = rng.random::<f64>() * total;
            let mut idx = samples.len() - 1;
            for (i, &w) in weights.iter().enumerate() {
                if target < w {
                    idx = i;
                    break;
                }
                target -= w;
            }
            idx
        };

        let px = samples[chosen];
        centroids.push([px.r as f64, px.g as f64, px.b as f64]);
    }

    centroids
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// 8x8 buffer split into four 4x4 quadrants of well-separated colors.
    fn quadrant_buffer() -> PixelBuffer {
        let colors = [
            Rgb::new(250, 10, 10),
            Rgb::new(10, 250, 10),
            Rgb::new(10, 10, 250),
            Rgb::new(240, 240, 240),
        ];
        let mut buf = PixelBuffer::filled(8, 8, Rgb::BLACK).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                let quadrant = (y / 4) * 2 + x / 4;
                buf.set(x, y, colors[quadrant as usize]).unwrap();
            }
        }
        buf
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(validate_palette_size(4).is_ok());
        assert!(validate_palette_size(32).is_ok());
        assert!(validate_palette_size(2).is_err());
        assert!(validate_palette_size(34).is_err());
        assert!(validate_palette_size(9).is_err());
        let buf = quadrant_buffer();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(extract_palette(&buf, 5, &mut rng).is_err());
    }

    #[test]
    fn finds_the_four_quadrant_colors() {
        let buf = quadrant_buffer();
        let mut rng = StdRng::seed_from_u64(42);
        let palette = extract_palette(&buf, 4, &mut rng).unwrap();
        assert_eq!(palette.len(), 4);
        // With four tight clusters k-means recovers them exactly.
        for expected in [
            Rgb::new(250, 10, 10),
            Rgb::new(10, 250, 10),
            Rgb::new(10, 10, 250),
            Rgb::new(240, 240, 240),
        ] {
            assert!(
                palette.colors().iter().any(|&c| c.distance(expected) < 2.0),
                "palette {:?} missing {:?}",
                palette.colors(),
                expected
            );
        }
    }

    #[test]
    fn palette_is_sorted_by_descending_luminance() {
        let buf = quadrant_buffer();
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let palette = extract_palette(&buf, 4, &mut rng).unwrap();
            let lums: Vec<f64> = palette.colors().iter().map(|c| c.luminance()).collect();
            assert!(
                lums.windows(2).all(|w| w[0] >= w[1]),
                "luminance not sorted: {lums:?}"
            );
        }
    }

    #[test]
    fn clamps_to_distinct_sample_count() {
        let buf = PixelBuffer::filled(4, 4, Rgb::new(9, 9, 9)).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let palette = extract_palette(&buf, 8, &mut rng).unwrap();
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.colors()[0], Rgb::new(9, 9, 9));
    }

    #[test]
    fn seeded_extraction_is_reproducible() {
        let buf = quadrant_buffer();
        let a = extract_palette(&buf, 4, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = extract_palette(&buf, 4, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn nearest_breaks_ties_toward_lighter_entry() {
        // 100 and 120 are equidistant from 110; the palette sorts 120
        // (lighter) first, so it must win.
        let palette = Palette::new(vec![Rgb::new(100, 100, 100), Rgb::new(120, 120, 120)]);
        assert_eq!(palette.colors()[0], Rgb::new(120, 120, 120));
        assert_eq!(palette.nearest(110.0, 110.0, 110.0), Rgb::new(120, 120, 120));
    }

    #[test]
    fn numbered_is_one_indexed() {
        let palette = Palette::new(vec![Rgb::BLACK, Rgb::WHITE]);
        let numbered: Vec<(usize, Rgb)> = palette.numbered().collect();
        assert_eq!(numbered, vec![(1, Rgb::WHITE), (2, Rgb::BLACK)]);
    }

    #[test]
    fn new_drops_exact_duplicates() {
        let palette = Palette::new(vec![Rgb::WHITE, Rgb::BLACK, Rgb::WHITE]);
        assert_eq!(palette.len(), 2);
    }
}
