//! Grid mapping: sensor-layout coordinates → integer raster cells.
//!
//! For a raster of `W × H` cells, per axis:
//!
//! ```text
//! lo     = min(p) - 2                     fixed 2-unit margin on the low side
//! factor = (max(p) - lo) / (W - 2)
//! p'     = clamp(round((p - lo) / factor), 0, W - 1)
//! ```
//!
//! so the layout's bounding box lands on `[2 / factor, W - 2]` and the far
//! edge of the raster stays free.
//!
//! The margin is in layout units, not cells, so mapping a grid-mapped layout
//! again is only stable (within one cell) when the layout spans many cells.
//! A small layout on a large raster shifts towards the origin on the second
//! pass, and on a 3-cell axis every channel collapses onto cell 1, which a
//! second pass rejects as [`TopoError::InvalidLayout`].
use log::debug;

use crate::error::{Result, TopoError};
use crate::layout::ChannelLayout;

/// Margin subtracted from the low side of the bounding box, in layout units.
pub const LOW_MARGIN: f64 = 2.0;

/// Affine sensor → raster transform computed from a layout's bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    /// Low corner after the margin is applied.
    pub origin: [f64; 2],
    /// Layout units per raster cell.
    pub factor: [f64; 2],
    /// Raster size `(width, height)`.
    pub size: (usize, usize),
}

impl GridTransform {
    /// Fit the transform for `layout` on a `(width, height)` raster.
    ///
    /// # Errors
    ///
    /// * [`TopoError::RasterTooSmall`] if either side is below 3.
    /// * [`TopoError::InvalidLayout`] for an empty layout, a non-finite
    ///   coordinate, or zero extent along either axis.
    pub fn fit(layout: &ChannelLayout, size: (usize, usize)) -> Result<Self> {
        let (width, height) = size;
        if width < 3 || height < 3 {
            return Err(TopoError::RasterTooSmall { width, height });
        }
        if let Some((name, p)) = layout.iter().find(|(_, p)| !p[0].is_finite() || !p[1].is_finite()) {
            return Err(TopoError::InvalidLayout(format!(
                "channel '{name}' has non-finite position {p:?}"
            )));
        }
        let (lo, hi) = layout
            .bounds()
            .ok_or_else(|| TopoError::InvalidLayout("layout has no channels".into()))?;

        let mut origin = [0.0; 2];
        let mut factor = [0.0; 2];
        for (axis, cells) in [(0, width), (1, height)] {
            if hi[axis] == lo[axis] {
                return Err(TopoError::InvalidLayout(format!(
                    "all channels share {} = {}",
                    if axis == 0 { "x" } else { "y" },
                    lo[axis]
                )));
            }
            origin[axis] = lo[axis] - LOW_MARGIN;
            factor[axis] = (hi[axis] - origin[axis]) / (cells - 2) as f64;
        }

        Ok(Self { origin, factor, size })
    }

    /// Raster cell `[x, y]` of a layout-space point, rounded and clamped.
    pub fn apply(&self, p: [f64; 2]) -> [f64; 2] {
        let max = [(self.size.0 - 1) as f64, (self.size.1 - 1) as f64];
        let mut out = [0.0; 2];
        for axis in 0..2 {
            let v = ((p[axis] - self.origin[axis]) / self.factor[axis]).round();
            out[axis] = v.clamp(0.0, max[axis]);
        }
        out
    }
}

/// Return a copy of `layout` with every position replaced by its raster cell.
///
/// ```
/// use topoplot::{grid::map_to_grid, ChannelLayout};
///
/// let layout: ChannelLayout =
///     [("A", [0.0, 0.0]), ("B", [1.0, 0.0]), ("C", [0.0, 1.0])].into_iter().collect();
/// let px = map_to_grid(&layout, (4, 4)).unwrap();
/// assert_eq!(px.get("A"), Some([1.0, 1.0]));
/// assert_eq!(px.get("B"), Some([2.0, 1.0]));
/// assert_eq!(px.get("C"), Some([1.0, 2.0]));
/// ```
pub fn map_to_grid(layout: &ChannelLayout, size: (usize, usize)) -> Result<ChannelLayout> {
    let mut out = layout.clone();
    map_to_grid_inplace(&mut out, size)?;
    Ok(out)
}

/// In-place variant of [`map_to_grid`].  On error `layout` is untouched.
pub fn map_to_grid_inplace(layout: &mut ChannelLayout, size: (usize, usize)) -> Result<GridTransform> {
    let tf = GridTransform::fit(layout, size)?;
    for p in layout.positions_mut() {
        *p = tf.apply(*p);
    }
    debug!(
        "grid-mapped {} channels onto {}x{} (factor {:.4}, {:.4})",
        layout.len(),
        size.0,
        size.1,
        tf.factor[0],
        tf.factor[1]
    );
    Ok(tf)
}
