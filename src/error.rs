use thiserror::Error;

/// Errors surfaced across the library boundary.
///
/// Degenerate clustering (fewer distinct sample colors than the requested
/// palette size) is not an error: the extractor clamps the palette size and
/// callers observe the shorter palette. Invalid editor selections are also
/// not errors; those operations are silent no-ops by contract.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected before any processing; no partial buffer is produced.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Pixel coordinate query outside the buffer.
    #[error("coordinate ({x}, {y}) is outside the {width}x{height} buffer")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// Image decoding or PNG encoding failed.
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
