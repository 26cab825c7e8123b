//! Channel coordinate maps and layout-file reading.
//!
//! A [`ChannelLayout`] is an **ordered** association list of channel names and
//! 2-D positions.  Its order is the column order of the signal matrix and the
//! write order of [`build_topo_matrix`](crate::raster::build_topo_matrix), so
//! when two channels land on the same raster cell the later one wins.
//!
//! Layout text files follow MNE's formats:
//!
//! ```text
//! .lout   -25.0  25.0  -25.0  25.0          <- xmin xmax ymin ymax header
//!         000  -22.1  14.3  4.0  3.0  Fp1   <- id x y width height name
//! .lay    1    0.10  0.80  0.05  0.04  Fp1  <- same lines, no header
//! ```
//!
//! The channel position is the centre of its box, `(x + w/2, y + h/2)`.
//! Names may contain spaces (`MEG 0113`); everything after the fifth column is
//! the name.
use std::path::Path;

use log::{debug, warn};
use ndarray::Array2;

use crate::error::{Result, TopoError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelLayout {
    entries: Vec<(String, [f64; 2])>,
}

impl ChannelLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a channel, or move an existing one to `pos` keeping its slot.
    pub fn insert(&mut self, name: impl Into<String>, pos: [f64; 2]) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = pos,
            None => self.entries.push((name, pos)),
        }
    }

    pub fn get(&self, name: &str) -> Option<[f64; 2]> {
        self.entries.iter().find(|(n, _)| n == name).map(|&(_, p)| p)
    }

    /// Slot of `name` in iteration order (= signal column index).
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, [f64; 2])> + '_ {
        self.entries.iter().map(|(n, p)| (n.as_str(), *p))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn positions(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.entries.iter().map(|&(_, p)| p)
    }

    pub(crate) fn positions_mut(&mut self) -> impl Iterator<Item = &mut [f64; 2]> + '_ {
        self.entries.iter_mut().map(|(_, p)| p)
    }

    /// `([xmin, ymin], [xmax, ymax])`, or `None` for an empty layout.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut it = self.positions();
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), p| {
            ([lo[0].min(p[0]), lo[1].min(p[1])], [hi[0].max(p[0]), hi[1].max(p[1])])
        }))
    }

    /// Keep only the channels in `names`, in the order given by `names`.
    ///
    /// Unknown names are skipped with a warning.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let mut out = Self::new();
        for name in names {
            let name = name.as_ref();
            match self.get(name) {
                Some(p) => out.insert(name, p),
                None => warn!("channel '{name}' not present in layout, skipped"),
            }
        }
        out
    }

    /// Build from parallel name / position lists.  `pos` is `[C, >=2]`; only
    /// the first two columns are used.
    pub fn from_positions(names: &[String], pos: &Array2<f64>) -> Result<Self> {
        if pos.ncols() < 2 {
            return Err(TopoError::InvalidLayout(format!(
                "channel positions need at least 2 columns (x, y), got {}",
                pos.ncols()
            )));
        }
        if pos.nrows() != names.len() {
            return Err(TopoError::ShapeMismatch {
                expected: names.len(),
                actual: pos.nrows(),
            });
        }
        Ok(names
            .iter()
            .zip(pos.rows())
            .map(|(n, row)| (n.clone(), [row[0], row[1]]))
            .collect())
    }

    /// Read an MNE `.lout` or `.lay` layout file.
    pub fn from_layout_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let layout = parse_layout(&text)?;
        debug!("loaded {} channels from {}", layout.len(), path.display());
        Ok(layout)
    }
}

impl FromIterator<(String, [f64; 2])> for ChannelLayout {
    fn from_iter<I: IntoIterator<Item = (String, [f64; 2])>>(iter: I) -> Self {
        let mut out = Self::new();
        for (n, p) in iter {
            out.insert(n, p);
        }
        out
    }
}

impl<'a> FromIterator<(&'a str, [f64; 2])> for ChannelLayout {
    fn from_iter<I: IntoIterator<Item = (&'a str, [f64; 2])>>(iter: I) -> Self {
        iter.into_iter().map(|(n, p)| (n.to_string(), p)).collect()
    }
}

/// Parse the text of a `.lout` / `.lay` file.
///
/// A first line made of exactly four numbers is treated as the `.lout`
/// bounding-box header and skipped.  Blank lines and `#` comments are ignored.
pub fn parse_layout(text: &str) -> Result<ChannelLayout> {
    let mut layout = ChannelLayout::new();
    let mut seen_data = false;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if !seen_data && tokens.len() == 4 && tokens.iter().all(|t| t.parse::<f64>().is_ok()) {
            seen_data = true;
            continue;
        }
        seen_data = true;

        if tokens.len() < 6 {
            return Err(TopoError::LayoutParse {
                line: line_no,
                msg: format!("expected 'id x y w h name', got {} fields", tokens.len()),
            });
        }
        let num = |k: usize| -> Result<f64> {
            tokens[k].parse::<f64>().map_err(|e| TopoError::LayoutParse {
                line: line_no,
                msg: format!("field {k} '{}': {e}", tokens[k]),
            })
        };
        let (x, y, w, h) = (num(1)?, num(2)?, num(3)?, num(4)?);
        let name = tokens[5..].join(" ");

        if layout.get(&name).is_some() {
            warn!("layout line {line_no}: duplicate channel '{name}', keeping last position");
        }
        layout.insert(name, [x + w / 2.0, y + h / 2.0]);
    }

    if layout.is_empty() {
        return Err(TopoError::InvalidLayout("layout file lists no channels".into()));
    }
    Ok(layout)
}
