//! Topographic matrix builder: one time sample → sparse `[H, W]` raster.
//!
//! Cell `(y, x)` of a grid-mapped channel receives that channel's value; all
//! other cells stay 0 ("no data").  Channels are written in layout order, so
//! when two channels share a cell the **later one wins**.  That loss is a
//! property of rasterising onto a coarse grid; pick a finer raster to keep
//! every channel.
use log::warn;
use ndarray::Array2;

use crate::layout::ChannelLayout;

/// Build the raster for time sample `t` of `signal` ([T, C]).
///
/// `layout` must already be grid-mapped (see [`crate::grid::map_to_grid`]);
/// positions that round outside the raster are skipped.
///
/// Falls back to an all-zero raster (with a warning) when the layout's
/// channel count differs from `signal.ncols()` or when `t` is out of range.
/// A caller that must tell this apart from a genuinely flat field has to
/// check the shapes itself.
pub fn build_topo_matrix(
    signal: &Array2<f64>,
    layout: &ChannelLayout,
    size: (usize, usize),
    t: usize,
) -> Array2<f64> {
    RasterBuilder::new(layout, size).build(signal, t)
}

/// Precomputed channel → cell table for rasterising many samples of the same
/// recording.
#[derive(Debug, Clone)]
pub struct RasterBuilder {
    /// `(channel index, row, col)` in layout order; off-raster channels dropped.
    cells: Vec<(usize, usize, usize)>,
    n_chan: usize,
    size: (usize, usize),
}

impl RasterBuilder {
    pub fn new(layout: &ChannelLayout, size: (usize, usize)) -> Self {
        let (width, height) = size;
        let cells = layout
            .positions()
            .enumerate()
            .filter_map(|(c, [x, y])| {
                let (col, row) = (x.round(), y.round());
                let inside = col >= 0.0 && row >= 0.0 && (col as usize) < width && (row as usize) < height;
                inside.then(|| (c, row as usize, col as usize))
            })
            .collect::<Vec<_>>();

        if cells.len() < layout.len() {
            warn!(
                "{} of {} channels fall outside the {width}x{height} raster",
                layout.len() - cells.len(),
                layout.len()
            );
        }
        Self { cells, n_chan: layout.len(), size }
    }

    /// Raster shape `[H, W]`.
    pub fn shape(&self) -> (usize, usize) {
        (self.size.1, self.size.0)
    }

    pub fn build(&self, signal: &Array2<f64>, t: usize) -> Array2<f64> {
        let mut raster = Array2::<f64>::zeros(self.shape());
        if signal.ncols() != self.n_chan {
            warn!(
                "layout has {} channels but signal has {} columns; returning empty raster",
                self.n_chan,
                signal.ncols()
            );
            return raster;
        }
        if t >= signal.nrows() {
            warn!("time sample {t} out of range (signal has {} samples)", signal.nrows());
            return raster;
        }
        for &(c, row, col) in &self.cells {
            raster[[row, col]] = signal[[t, c]];
        }
        raster
    }
}
