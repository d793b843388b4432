//! Block quantization: the pixelation core.
//!
//! The buffer is tiled into `block_size`-square blocks (last row/column
//! clipped to the buffer), each block is reduced to one representative
//! color, snapped to the nearest palette entry, and written back over the
//! whole block. Pre-grayscale, every output pixel is therefore a palette
//! member; the grayscale post-filter may produce off-palette grays.

use std::collections::HashMap;

use log::trace;

use crate::buffer::PixelBuffer;
use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::palette::Palette;
use crate::params::BlockMode;

/// One clipped rectangle of the block grid. `x1`/`y1` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Block {
    /// Pixel coordinates in scan order (row-major within the block).
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let (x0, x1) = (self.x0, self.x1);
        (self.y0..self.y1).flat_map(move |y| (x0..x1).map(move |x| (x, y)))
    }

    pub fn center(&self) -> (u32, u32) {
        (
            self.x0 + (self.x1 - self.x0) / 2,
            self.y0 + (self.y1 - self.y0) / 2,
        )
    }
}

/// The derived tiling of a buffer: `ceil(w/S) x ceil(h/S)` blocks.
/// Computed on demand, never stored.
#[derive(Clone, Copy, Debug)]
pub struct BlockGrid {
    width: u32,
    height: u32,
    block_size: u32,
}

impl BlockGrid {
    pub fn new(width: u32, height: u32, block_size: u32) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::InvalidInput(
                "block size must be at least 1".into(),
            ));
        }
        Ok(BlockGrid {
            width,
            height,
            block_size,
        })
    }

    pub fn cols(&self) -> u32 {
        self.width.div_ceil(self.block_size)
    }

    pub fn rows(&self) -> u32 {
        self.height.div_ceil(self.block_size)
    }

    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        let size = self.block_size;
        let (width, height) = (self.width, self.height);
        (0..self.rows()).flat_map(move |by| {
            (0..self.cols()).map(move |bx| {
                let x0 = bx * size;
                let y0 = by * size;
                Block {
                    x0,
                    y0,
                    x1: (x0 + size).min(width),
                    y1: (y0 + size).min(height),
                }
            })
        })
    }

    /// The block containing pixel (x, y).
    pub fn block_at(&self, x: u32, y: u32) -> Block {
        let x0 = x / self.block_size * self.block_size;
        let y0 = y / self.block_size * self.block_size;
        Block {
            x0,
            y0,
            x1: (x0 + self.block_size).min(self.width),
            y1: (y0 + self.block_size).min(self.height),
        }
    }
}

/// Quantize a buffer against a palette, producing a new buffer of the same
/// dimensions.
pub fn pixelate(
    input: &PixelBuffer,
    palette: &Palette,
    block_size: u32,
    mode: BlockMode,
    grayscale: bool,
) -> Result<PixelBuffer> {
    if palette.is_empty() {
        return Err(Error::InvalidInput("palette must not be empty".into()));
    }
    let grid = BlockGrid::new(input.width(), input.height(), block_size)?;
    trace!(
        "pixelating {}x{} into {}x{} blocks of {}px ({mode:?})",
        input.width(),
        input.height(),
        grid.cols(),
        grid.rows(),
        block_size
    );

    let mut out = input.clone();
    for block in grid.blocks() {
        let snapped = match mode {
            BlockMode::Average => {
                let (r, g, b) = block_average(input, &block);
                palette.nearest(r, g, b)
            }
            BlockMode::Dominant => {
                let dominant = block_dominant(input, &block);
                palette.nearest_color(dominant)
            }
        };
        let fill = if grayscale { snapped.to_gray() } else { snapped };
        for (x, y) in block.pixels() {
            out.set_unchecked(x, y, fill);
        }
    }
    Ok(out)
}

/// Componentwise mean over the block, kept fractional for the palette
/// distance test.
fn block_average(buffer: &PixelBuffer, block: &Block) -> (f64, f64, f64) {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for (x, y) in block.pixels() {
        let px = buffer.get_unchecked(x, y);
        sum[0] += px.r as u64;
        sum[1] += px.g as u64;
        sum[2] += px.b as u64;
        count += 1;
    }
    let n = count as f64;
    (sum[0] as f64 / n, sum[1] as f64 / n, sum[2] as f64 / n)
}

/// Most frequent exact color in the block. Ties resolve to the color seen
/// first in scan order (so a 50/50 block takes its top-left color).
fn block_dominant(buffer: &PixelBuffer, block: &Block) -> Rgb {
    let mut counts: HashMap<Rgb, (usize, usize)> = HashMap::new();
    for (order, (x, y)) in block.pixels().enumerate() {
        let px = buffer.get_unchecked(x, y);
        let entry = counts.entry(px).or_insert((0, order));
        entry.0 += 1;
    }
    counts
        .into_iter()
        .min_by_key(|&(_, (count, first_seen))| (std::cmp::Reverse(count), first_seen))
        .map(|(color, _)| color)
        .expect("blocks are never empty")
}
