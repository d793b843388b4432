//! Grid overlay: black lines over every block boundary.
//!
//! Lines are centered on each multiple of the block size (matching a canvas
//! stroke of the same width), inclusive of both buffer edges, and clipped to
//! the buffer. Width 0 is a no-op by contract.

use crate::buffer::PixelBuffer;
use crate::color::Rgb;

const LINE_COLOR: Rgb = Rgb::BLACK;

pub fn draw_grid(input: &PixelBuffer, block_size: u32, line_width: u32) -> PixelBuffer {
    let mut out = input.clone();
    if line_width == 0 || block_size == 0 {
        return out;
    }

    let width = out.width();
    let height = out.height();
    let half = (line_width / 2) as i64;

    // Vertical lines at x = 0, S, 2S, ... up to and including the right edge.
    let mut line_x = 0u32;
    loop {
        let start = line_x as i64 - half;
        for dx in 0..line_width as i64 {
            let x = start + dx;
            if (0..width as i64).contains(&x) {
                for y in 0..height {
                    out.set_rgba_unchecked(x as u32, y, LINE_COLOR, 255);
                }
            }
        }
        if line_x >= width {
            break;
        }
        line_x += block_size;
    }

    // Horizontal lines.
    let mut line_y = 0u32;
    loop {
        let start = line_y as i64 - half;
        for dy in 0..line_width as i64 {
            let y = start + dy;
            if (0..height as i64).contains(&y) {
                for x in 0..width {
                    out.set_rgba_unchecked(x, y as u32, LINE_COLOR, 255);
                }
            }
        }
        if line_y >= height {
            break;
        }
        line_y += block_size;
    }

    out
}
