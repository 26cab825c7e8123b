//! Error type for the topographic-plot pipeline.
//!
//! Only inputs that make a plot impossible are errors.  Recoverable
//! mismatches (e.g. a signal with the wrong channel count handed to the
//! matrix builder) fall back to an all-zero raster and a `warn!` record.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopoError {
    /// Empty layout, non-finite coordinate, or zero extent along an axis.
    #[error("invalid channel layout: {0}")]
    InvalidLayout(String),

    /// The grid mapper needs at least 3 cells per axis (`W - 2 > 0`).
    #[error("raster too small: {width}x{height} (need at least 3x3)")]
    RasterTooSmall { width: usize, height: usize },

    #[error("shape mismatch: expected {expected} channels, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Spline control points must have strictly increasing parameters.
    #[error("cannot fit spline: {0}")]
    DegenerateSpline(String),

    #[error("layout file line {line}: {msg}")]
    LayoutParse { line: usize, msg: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, TopoError>;
