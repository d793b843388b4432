//! Owned RGBA pixel buffers with value semantics.
//!
//! Every pipeline stage consumes a buffer reference and produces a new owned
//! buffer; no stage mutates a buffer a caller may still be rendering. The
//! one deliberate exception is the palette editor's substitution, which
//! rewrites the session's working buffer in place (the session owns it
//! exclusively).

use std::collections::HashSet;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::color::Rgb;
use crate::error::{Error, Result};

/// Row-major RGBA samples, 4 bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes. Rejects empty dimensions and length mismatches
    /// before any processing can touch the data.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(Error::InvalidInput(format!(
                "buffer length {} does not match {width}x{height} RGBA ({expected} bytes)",
                data.len()
            )));
        }
        Ok(PixelBuffer {
            width,
            height,
            data,
        })
    }

    /// A solid-color opaque buffer.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Result<Self> {
        let px = [color.r, color.g, color.b, 255];
        let data = px
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        PixelBuffer::from_raw(width, height, data)
    }

    pub fn from_image(image: RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        PixelBuffer::from_raw(width, height, image.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Exact color at (x, y); bounds-checked.
    pub fn get(&self, x: u32, y: u32) -> Result<Rgb> {
        if !self.contains(x, y) {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.get_unchecked(x, y))
    }

    /// Color at (x, y) for callers that have already validated bounds
    /// (inner pipeline loops).
    #[inline]
    pub(crate) fn get_unchecked(&self, x: u32, y: u32) -> Rgb {
        let i = self.offset(x, y);
        Rgb::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    pub fn set(&mut self, x: u32, y: u32, color: Rgb) -> Result<()> {
        if !self.contains(x, y) {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        self.set_unchecked(x, y, color);
        Ok(())
    }

    #[inline]
    pub(crate) fn set_unchecked(&mut self, x: u32, y: u32, color: Rgb) {
        let i = self.offset(x, y);
        self.data[i] = color.r;
        self.data[i + 1] = color.g;
        self.data[i + 2] = color.b;
    }

    #[inline]
    pub(crate) fn set_rgba_unchecked(&mut self, x: u32, y: u32, color: Rgb, alpha: u8) {
        let i = self.offset(x, y);
        self.data[i] = color.r;
        self.data[i + 1] = color.g;
        self.data[i + 2] = color.b;
        self.data[i + 3] = alpha;
    }

    /// Iterate colors in row-major scan order.
    pub fn pixels(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.data
            .chunks_exact(4)
            .map(|px| Rgb::new(px[0], px[1], px[2]))
    }

    /// Count of distinct RGB triples (alpha ignored), reported in the
    /// conversion summary.
    pub fn unique_color_count(&self) -> usize {
        let mut seen = HashSet::new();
        for px in self.pixels() {
            seen.insert(px);
        }
        seen.len()
    }

    /// Rewrite every pixel whose RGB exactly equals `old` to `new`,
    /// preserving alpha. Returns the number of pixels touched.
    pub fn replace_exact(&mut self, old: Rgb, new: Rgb) -> usize {
        let mut touched = 0;
        for px in self.data.chunks_exact_mut(4) {
            if px[0] == old.r && px[1] == old.g && px[2] == old.b {
                px[0] = new.r;
                px[1] = new.g;
                px[2] = new.b;
                touched += 1;
            }
        }
        touched
    }

    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .expect("buffer dimensions validated at construction")
    }

    /// PNG-encode for download/export.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let img = DynamicImage::ImageRgba8(self.to_image());
        img.write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)?;
        Ok(out)
    }
}
