//! Named colour maps.
//!
//! Every palette maps a scalar in `[0, 1]` to an RGB triple.  Values outside
//! that range (and NaN) are clamped by [`Palette::rgb`] itself, so callers can
//! hand over raw normalised raster values.
//!
//! | name       | look                                   |
//! |------------|----------------------------------------|
//! | `jet`      | blue → cyan → green → yellow → red     |
//! | `hot`      | black → red → yellow → white           |
//! | `hot-neg1` | `hot` with a black floor up to ~0.22   |
//! | `hot-neg2` | `hot` with a black floor up to 0.3     |
//! | `bone`     | grey with a blue tint                  |
//! | `redblue`  | blue → white → red (diverging)         |
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Palette {
    #[default]
    #[serde(rename = "jet")]
    Jet,
    #[serde(rename = "hot")]
    Hot,
    #[serde(rename = "hot-neg1")]
    HotNegative1,
    #[serde(rename = "hot-neg2")]
    HotNegative2,
    #[serde(rename = "bone")]
    Bone,
    #[serde(rename = "redblue")]
    RedBlue,
}

impl Palette {
    pub const ALL: [Palette; 6] = [
        Palette::Jet,
        Palette::Hot,
        Palette::HotNegative1,
        Palette::HotNegative2,
        Palette::Bone,
        Palette::RedBlue,
    ];

    /// Colour of `t`, clamped into `[0, 1]` first (NaN maps like 0).
    pub fn rgb(self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let (r, g, b) = match self {
            Palette::Jet => jet(t),
            Palette::Hot => hot_ramp(t, HOT),
            Palette::HotNegative1 => hot_ramp(t, HOT_NEG1),
            Palette::HotNegative2 => hot_ramp(t, HOT_NEG2),
            Palette::Bone => bone(t),
            Palette::RedBlue => red_blue(t),
        };
        [to_u8(r), to_u8(g), to_u8(b)]
    }

    pub fn name(self) -> &'static str {
        match self {
            Palette::Jet => "jet",
            Palette::Hot => "hot",
            Palette::HotNegative1 => "hot-neg1",
            Palette::HotNegative2 => "hot-neg2",
            Palette::Bone => "bone",
            Palette::RedBlue => "redblue",
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Palette {
    type Err = String;

    /// Case-insensitive; `_` and `-` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('_', "-");
        Palette::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or_else(|| {
                let names: Vec<&str> = Palette::ALL.iter().map(|p| p.name()).collect();
                format!("unknown palette '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

// ── Colour-map implementations ──────────────────────────────────────────────

fn to_u8(x: f64) -> u8 {
    (x * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Rising ramp: 0 below `lo`, 1 above `hi`, linear in between.
#[inline]
fn ramp(t: f64, lo: f64, hi: f64) -> f64 {
    ((t - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Classic "jet" colour map (dark blue → cyan → green → yellow → dark red).
fn jet(t: f64) -> (f64, f64, f64) {
    let r = (1.5 - (4.0 * t - 3.0).abs()).clamp(0.0, 1.0);
    let g = (1.5 - (4.0 * t - 2.0).abs()).clamp(0.0, 1.0);
    let b = (1.5 - (4.0 * t - 1.0).abs()).clamp(0.0, 1.0);
    (r, g, b)
}

/// Breakpoints `[red starts, red saturates / green starts, green saturates / blue starts]`.
const HOT: [f64; 3] = [0.0, 0.375, 0.75];
const HOT_NEG1: [f64; 3] = [0.2188, 0.5781, 0.8125];
const HOT_NEG2: [f64; 3] = [0.3, 0.65, 0.9];

fn hot_ramp(t: f64, [r0, g0, b0]: [f64; 3]) -> (f64, f64, f64) {
    (ramp(t, r0, g0), ramp(t, g0, b0), ramp(t, b0, 1.0))
}

/// `(7 · grey + hot with channels reversed) / 8`.
fn bone(t: f64) -> (f64, f64, f64) {
    let (hr, hg, hb) = hot_ramp(t, HOT);
    ((7.0 * t + hb) / 8.0, (7.0 * t + hg) / 8.0, (7.0 * t + hr) / 8.0)
}

fn red_blue(t: f64) -> (f64, f64, f64) {
    if t < 0.5 {
        let w = 2.0 * t;
        (w, w, 1.0)
    } else {
        let w = 2.0 * (1.0 - t);
        (1.0, w, w)
    }
}
