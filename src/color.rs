//! Color primitives shared by every pipeline stage.
//!
//! Colors are exact integer RGB triples: equality is per-channel with no
//! tolerance, which is what makes palette-driven recoloring safe (a
//! substitution only ever touches pixels still carrying the original
//! quantized color). The only "fuzzy" comparisons in the crate go through
//! [`Rgb::distance`], and only where a similarity operation is explicitly
//! part of the contract.

use crate::error::{Error, Result};

/// An exact (r, g, b) triple. Alpha is carried separately by the pixel
/// buffer; palette and recolor logic never look at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Euclidean distance in RGB space: `sqrt(dr^2 + dg^2 + db^2)`.
    pub fn distance(self, other: Rgb) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Perceptual luminance: `0.299 r + 0.587 g + 0.114 b`.
    pub fn luminance(self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }

    /// Plain channel mean, used by the grayscale post-filter and the Sobel
    /// intensity function (not the perceptual luminance above).
    pub fn intensity(self) -> f64 {
        (self.r as f64 + self.g as f64 + self.b as f64) / 3.0
    }

    /// The grayscale rendition of this color: channel mean in all channels.
    pub fn to_gray(self) -> Rgb {
        let g = self.intensity().round() as u8;
        Rgb::new(g, g, g)
    }

    /// Scale every channel by `factor` (used by the highlight dim overlay).
    pub fn scaled(self, factor: f64) -> Rgb {
        Rgb::new(
            (self.r as f64 * factor).round() as u8,
            (self.g as f64 * factor).round() as u8,
            (self.b as f64 * factor).round() as u8,
        )
    }

    /// `RRGGBB` hex, the format the wasm and CLI surfaces report palettes in.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parse `RRGGBB` (optionally `#`-prefixed).
    pub fn from_hex(s: &str) -> Result<Self> {
        let hex = s.trim_start_matches('#');
        if hex.len() != 6 {
            return Err(Error::InvalidInput(format!(
                "hex color must be 6 characters, got {:?}",
                s
            )));
        }
        let parse = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| Error::InvalidInput(format!("invalid hex color {:?}", s)))
        };
        Ok(Rgb::new(parse(0..2)?, parse(2..4)?, parse(4..6)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Rgb::new(0, 0, 0);
        let b = Rgb::new(3, 4, 0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.distance(a), 5.0);
        assert_eq!(a.distance(a), 0.0);
    }

    #[test]
    fn luminance_weights_channels() {
        assert_eq!(Rgb::BLACK.luminance(), 0.0);
        assert_eq!(Rgb::WHITE.luminance(), 255.0);
        // Green dominates red dominates blue.
        let r = Rgb::new(255, 0, 0).luminance();
        let g = Rgb::new(0, 255, 0).luminance();
        let b = Rgb::new(0, 0, 255).luminance();
        assert!(g > r && r > b);
    }

    #[test]
    fn gray_is_channel_mean() {
        assert_eq!(Rgb::new(10, 20, 30).to_gray(), Rgb::new(20, 20, 20));
        assert_eq!(Rgb::new(255, 0, 0).to_gray(), Rgb::new(85, 85, 85));
    }

    #[test]
    fn hex_round_trip() {
        let c = Rgb::new(0x1A, 0xB2, 0x03);
        assert_eq!(c.to_hex(), "1AB203");
        assert_eq!(Rgb::from_hex("1AB203").unwrap(), c);
        assert_eq!(Rgb::from_hex("#1ab203").unwrap(), c);
        assert!(Rgb::from_hex("12345").is_err());
        assert!(Rgb::from_hex("zzzzzz").is_err());
    }
}
