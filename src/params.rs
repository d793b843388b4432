//! Caller-supplied conversion parameters and their valid ranges.

use image::imageops;
use image::RgbaImage;

use crate::error::{Error, Result};

pub const BLOCK_SIZE_MIN: u32 = 1;
pub const BLOCK_SIZE_MAX: u32 = 20;
pub const EDGE_THRESHOLD_MAX: u32 = 100;
pub const GRID_LINE_WIDTH_MAX: u32 = 5;

/// Orientation applied to the source image before any processing.
/// 90 and 270 swap width and height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Result<Self> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(Error::InvalidInput(format!(
                "rotation must be one of 0/90/180/270 degrees, got {other}"
            ))),
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Apply the rotation, producing a new image.
    pub fn apply(self, image: &RgbaImage) -> RgbaImage {
        match self {
            Rotation::Deg0 => image.clone(),
            Rotation::Deg90 => imageops::rotate90(image),
            Rotation::Deg180 => imageops::rotate180(image),
            Rotation::Deg270 => imageops::rotate270(image),
        }
    }
}

/// How a block's representative color is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockMode {
    /// Componentwise mean of every pixel in the block.
    #[default]
    Average,
    /// Most frequent exact color in the block; ties go to the color first
    /// seen in scan order.
    Dominant,
}

/// The full knob set for one conversion pass. Defaults match the
/// interactive converter's initial slider positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    pub block_size: u32,
    pub palette_size: usize,
    pub edge_threshold: u32,
    pub grid_line_width: u32,
    pub grayscale: bool,
    pub grid_lines: bool,
    pub edge_detection: bool,
    pub block_mode: BlockMode,
    pub confirmation_mode: bool,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            block_size: 7,
            palette_size: 8,
            edge_threshold: 15,
            grid_line_width: 1,
            grayscale: false,
            grid_lines: false,
            edge_detection: false,
            block_mode: BlockMode::Average,
            confirmation_mode: false,
        }
    }
}

impl Params {
    /// Reject out-of-range parameters before any pixel work starts.
    pub fn validate(&self) -> Result<()> {
        if !(BLOCK_SIZE_MIN..=BLOCK_SIZE_MAX).contains(&self.block_size) {
            return Err(Error::InvalidInput(format!(
                "block size must be in [{BLOCK_SIZE_MIN}, {BLOCK_SIZE_MAX}], got {}",
                self.block_size
            )));
        }
        crate::palette::validate_palette_size(self.palette_size)?;
        if self.edge_threshold > EDGE_THRESHOLD_MAX {
            return Err(Error::InvalidInput(format!(
                "edge threshold must be in [0, {EDGE_THRESHOLD_MAX}], got {}",
                self.edge_threshold
            )));
        }
        if self.grid_line_width > GRID_LINE_WIDTH_MAX {
            return Err(Error::InvalidInput(format!(
                "grid line width must be in [0, {GRID_LINE_WIDTH_MAX}], got {}",
                self.grid_line_width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_parsing() {
        assert_eq!(Rotation::from_degrees(0).unwrap(), Rotation::Deg0);
        assert_eq!(Rotation::from_degrees(270).unwrap(), Rotation::Deg270);
        assert!(Rotation::from_degrees(45).is_err());
        assert!(Rotation::Deg90.swaps_dimensions());
        assert!(!Rotation::Deg180.swaps_dimensions());
    }

    #[test]
    fn rotation_turns_pixels() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 255, 0, 255]));
        let rotated = Rotation::Deg90.apply(&img);
        assert_eq!(rotated.dimensions(), (1, 2));
        assert_eq!(rotated.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(rotated.get_pixel(0, 1).0, [0, 255, 0, 255]);
    }

    #[test]
    fn default_params_are_valid() {
        Params::default().validate().unwrap();
    }

    #[test]
    fn validation_rejects_out_of_range() {
        let mut p = Params::default();
        p.block_size = 0;
        assert!(p.validate().is_err());
        p.block_size = 21;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.palette_size = 7; // odd
        assert!(p.validate().is_err());
        p.palette_size = 34;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.edge_threshold = 101;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.grid_line_width = 6;
        assert!(p.validate().is_err());
    }
}
