//! Plot configuration.
//!
//! [`TopoConfig`] holds every tunable parameter of the topographic-plot
//! pipeline.  All fields have defaults suitable for an on-screen head plot.
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::palette::Palette;

/// Configuration for [`topoplot`](crate::topoplot) and
/// [`render_frame`](crate::render_frame).
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use topoplot::{Palette, TopoConfig};
///
/// let cfg = TopoConfig {
///     raster_size: (32, 32),
///     palette:     Palette::Hot,
///     ..TopoConfig::default()
/// };
/// assert_eq!(cfg.image_size, (256, 256));
/// ```
///
/// The struct is also (de)serializable, so a JSON file such as
/// `{"raster_size": [48, 48], "palette": "bone"}` can be loaded with
/// `serde_json`.  Missing keys take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopoConfig {
    /// Raster size `(width, height)` in cells.
    ///
    /// Channel positions are grid-mapped onto this raster.  Both sides must
    /// be at least 3.
    ///
    /// Default: `(64, 64)`.
    pub raster_size: (usize, usize),

    /// Output image size `(width, height)` in pixels.
    ///
    /// When the raster is larger than the image, cells are sampled with an
    /// integer stride of `floor(raster / image)`.
    ///
    /// Default: `(256, 256)`.
    pub image_size: (u32, u32),

    /// Colour map applied to `|value|` after global max-abs scaling.
    ///
    /// Default: [`Palette::Jet`].
    pub palette: Palette,

    /// Fill empty cells with the row-wise cubic spline before rendering.
    ///
    /// Default: `true`.
    pub interpolate: bool,

    /// Min–max normalise every channel to `[0, 1]` before rasterising.
    ///
    /// Default: `true`.
    pub normalize: bool,

    /// Time samples to render.  `None` renders the whole signal.
    ///
    /// Default: `None`.
    pub samples: Option<Range<usize>>,
}

impl Default for TopoConfig {
    fn default() -> Self {
        Self {
            raster_size: (64, 64),
            image_size: (256, 256),
            palette: Palette::Jet,
            interpolate: true,
            normalize: true,
            samples: None,
        }
    }
}

impl TopoConfig {
    /// Time samples to render for a signal with `n_times` rows.
    ///
    /// The configured range is clipped to `0..n_times`.
    ///
    /// ```
    /// use topoplot::TopoConfig;
    /// let cfg = TopoConfig { samples: Some(10..500), ..TopoConfig::default() };
    /// assert_eq!(cfg.sample_range(100), 10..100);
    /// ```
    pub fn sample_range(&self, n_times: usize) -> Range<usize> {
        match &self.samples {
            Some(r) => r.start.min(n_times)..r.end.min(n_times),
            None => 0..n_times,
        }
    }
}
