//! Sobel edge overlay, applied after quantization.
//!
//! Gradients are computed over the channel-mean intensity of the input
//! buffer only (the output copy is written separately, so earlier writes
//! never feed back into later gradients). Interior pixels whose gradient
//! magnitude exceeds the threshold become opaque black; everything else,
//! including the whole 1-pixel border, passes through untouched.

use crate::buffer::PixelBuffer;
use crate::color::Rgb;

pub fn detect_edges(input: &PixelBuffer, threshold: u32) -> PixelBuffer {
    let width = input.width();
    let height = input.height();
    let mut out = input.clone();
    if width < 3 || height < 3 {
        // No interior pixels to test.
        return out;
    }

    let threshold = threshold as f64;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let intensity =
                |dx: i64, dy: i64| -> f64 {
                    let px = input.get_unchecked(
                        (x as i64 + dx) as u32,
                        (y as i64 + dy) as u32,
                    );
                    px.intensity()
                };

            let gx = -intensity(-1, -1) + intensity(1, -1)
                - 2.0 * intensity(-1, 0)
                + 2.0 * intensity(1, 0)
                - intensity(-1, 1)
                + intensity(1, 1);
            let gy = -intensity(-1, -1) - 2.0 * intensity(0, -1) - intensity(1, -1)
                + intensity(-1, 1)
                + 2.0 * intensity(0, 1)
                + intensity(1, 1);

            let magnitude = (gx * gx + gy * gy).sqrt();
            if magnitude > threshold {
                out.set_rgba_unchecked(x, y, Rgb::BLACK, 255);
            }
        }
    }
    out
}
