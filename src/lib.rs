//! # topoplot — topographic MEG/EEG maps in pure Rust
//!
//! `topoplot` turns a sensor layout and a `[T, C]` signal matrix into one
//! colour-mapped image per time sample.  No GUI toolkit, no BLAS, no C
//! libraries: the images are plain [`image::RgbImage`] buffers that a viewer,
//! a PNG encoder or an animation writer can consume.
//!
//! ## Pipeline overview
//!
//! ```text
//! layout (.lout / .lay)          signal [T, C]
//!   │                               │
//!   ├─ grid::map_to_grid()          ├─ normalize::minmax_columns_inplace()
//!   │  sensor → raster cells        │  per channel → [0, 1]
//!   └───────────────┬───────────────┘
//!                   ├─ raster::build_topo_matrix()   one sample → sparse [H, W]
//!                   ├─ spline::interpolate_rows()    row-wise cubic fill
//!                   └─ render::render_image()        ÷ max|v| → palette → RGB
//! ```
//!
//! ## Quick start
//!
//! ```
//! use topoplot::{topoplot, ChannelLayout, TopoConfig};
//! use ndarray::Array2;
//!
//! let layout: ChannelLayout = [
//!     ("Fz", [0.0, 10.0]),
//!     ("C3", [-10.0, 0.0]),
//!     ("C4", [10.0, 0.0]),
//!     ("Pz", [0.0, -10.0]),
//! ].into_iter().collect();
//!
//! // 20 samples × 4 channels
//! let signal = Array2::from_shape_fn((20, 4), |(t, c)| ((t + 3 * c) as f64 * 0.4).sin());
//!
//! let cfg = TopoConfig { raster_size: (32, 32), image_size: (64, 64), ..TopoConfig::default() };
//! let frames = topoplot(&layout, &signal, &cfg).unwrap();
//! assert_eq!(frames.len(), 20);
//! assert_eq!(frames[0].dimensions(), (64, 64));
//! ```
//!
//! ## Running individual steps
//!
//! ```
//! use topoplot::grid::map_to_grid;
//! use topoplot::normalize::normalize_signal;
//! use topoplot::raster::build_topo_matrix;
//! use topoplot::spline::interpolate_rows;
//! use topoplot::render::render_image;
//! use topoplot::{ChannelLayout, Palette};
//! use ndarray::array;
//!
//! let layout: ChannelLayout =
//!     [("A", [0.0, 0.0]), ("B", [1.0, 0.0]), ("C", [0.0, 1.0])].into_iter().collect();
//! let px     = map_to_grid(&layout, (8, 8)).unwrap();
//! let signal = normalize_signal(&array![[1.0, -1.0, 0.5], [0.0, 2.0, 1.0]]);
//! let raster = build_topo_matrix(&signal, &px, (8, 8), 1);
//! let filled = interpolate_rows(&raster);
//! let img    = render_image(&filled, (8, 8), Palette::Hot);
//! assert_eq!(img.dimensions(), (8, 8));
//! ```

pub mod config;
pub mod error;
pub mod grid;
pub mod io;
pub mod layout;
pub mod normalize;
pub mod palette;
pub mod raster;
pub mod render;
pub mod spline;

use image::RgbImage;
use log::debug;
use ndarray::Array2;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use config::TopoConfig;
pub use error::{Result, TopoError};
pub use grid::{map_to_grid, map_to_grid_inplace, GridTransform};
pub use io::{save_png, StWriter, TopoInput};
pub use layout::{parse_layout, ChannelLayout};
pub use normalize::{minmax_columns_inplace, normalize_signal};
pub use palette::Palette;
pub use raster::{build_topo_matrix, RasterBuilder};
pub use render::{max_abs, render_image};
pub use spline::{control_points, interpolate_row, interpolate_rows, BSpline};

/// Render sample `t` of an already normalised signal on a grid-mapped layout.
///
/// Matrix builder → (optional) spline fill → renderer.  Never fails: a
/// layout/signal mismatch yields the palette's zero colour everywhere.
pub fn render_frame(
    signal: &Array2<f64>,
    layout_px: &ChannelLayout,
    cfg: &TopoConfig,
    t: usize,
) -> RgbImage {
    let raster = build_topo_matrix(signal, layout_px, cfg.raster_size, t);
    let raster = if cfg.interpolate { interpolate_rows(&raster) } else { raster };
    render_image(&raster, cfg.image_size, cfg.palette)
}

/// Rasters (spline-filled if `cfg.interpolate`) for every sample in
/// [`TopoConfig::sample_range`].
///
/// # Errors
///
/// * [`TopoError::ShapeMismatch`] if `layout.len() != signal.ncols()`.
/// * Any grid-mapping error (degenerate layout, raster below 3×3).
pub fn topo_rasters(
    layout: &ChannelLayout,
    signal: &Array2<f64>,
    cfg: &TopoConfig,
) -> Result<Vec<Array2<f64>>> {
    if layout.len() != signal.ncols() {
        return Err(TopoError::ShapeMismatch {
            expected: layout.len(),
            actual: signal.ncols(),
        });
    }
    let layout_px = map_to_grid(layout, cfg.raster_size)?;

    let normalized;
    let signal = if cfg.normalize {
        normalized = normalize_signal(signal);
        &normalized
    } else {
        signal
    };

    let builder = RasterBuilder::new(&layout_px, cfg.raster_size);
    let range = cfg.sample_range(signal.nrows());
    debug!(
        "topo rasters: {} channels, samples {range:?}, interpolate={}",
        layout.len(),
        cfg.interpolate
    );

    Ok(range
        .map(|t| {
            let raster = builder.build(signal, t);
            if cfg.interpolate { interpolate_rows(&raster) } else { raster }
        })
        .collect())
}

/// Run the **full topographic-plot pipeline** and return one image per
/// rendered time sample.
///
/// # Pipeline steps
///
/// 1. Grid-map `layout` onto [`TopoConfig::raster_size`].
/// 2. Min–max normalise each channel (if [`TopoConfig::normalize`]).
/// 3. For each sample in [`TopoConfig::sample_range`]: build the sparse
///    raster, spline-fill it (if [`TopoConfig::interpolate`]) and render it
///    with [`TopoConfig::palette`] at [`TopoConfig::image_size`].
///
/// # Errors
///
/// Same as [`topo_rasters`].
pub fn topoplot(
    layout: &ChannelLayout,
    signal: &Array2<f64>,
    cfg: &TopoConfig,
) -> Result<Vec<RgbImage>> {
    Ok(topo_rasters(layout, signal, cfg)?
        .iter()
        .map(|r| render_image(r, cfg.image_size, cfg.palette))
        .collect())
}
