//! Safetensors and PNG I/O.
//!
//! Reader: [`TopoInput::load`] parses a `.safetensors` file holding
//!
//! | key        | dtype      | shape    | required |
//! |------------|------------|----------|----------|
//! | `data`     | F32 / F64  | `[T, C]` | yes      |
//! | `chan_pos` | F32 / F64  | `[C, 2+]`| no       |
//! | `ch_names` | U8 (utf-8, newline separated) | `[n]` | no |
//!
//! Writer: [`StWriter`] dumps named tensors (used by `topo_steps` and tests).
use anyhow::{bail, Context};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::Path;

use image::RgbImage;

use crate::error::TopoError;
use crate::layout::ChannelLayout;

// ── Low-level safetensors parser ─────────────────────────────────────────────

fn parse_header(bytes: &[u8]) -> anyhow::Result<(HashMap<String, serde_json::Value>, usize)> {
    if bytes.len() < 8 {
        bail!("safetensors file too small");
    }
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(len);
    let end = usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_add(8))
        .filter(|&end| end <= bytes.len())
        .with_context(|| format!("safetensors header claims {n} bytes, file has {}", bytes.len() - 8))?;
    let header: HashMap<String, serde_json::Value> =
        serde_json::from_slice(&bytes[8..end]).context("failed to parse safetensors header")?;
    Ok((header, end))
}

fn tensor_bytes<'a>(
    bytes: &'a [u8],
    data_start: usize,
    entry: &serde_json::Value,
) -> anyhow::Result<&'a [u8]> {
    let offsets = entry["data_offsets"]
        .as_array()
        .context("tensor entry without data_offsets")?;
    let offset = |k: usize| {
        offsets
            .get(k)
            .and_then(|v| v.as_u64())
            .and_then(|v| usize::try_from(v).ok())
            .context("bad data_offsets")
    };
    let (s, e) = (offset(0)?, offset(1)?);
    let start = data_start.checked_add(s).context("data_offsets overflow")?;
    let end = data_start.checked_add(e).context("data_offsets overflow")?;
    if start > end {
        bail!("data_offsets [{s}, {e}] are reversed");
    }
    bytes.get(start..end).context("tensor data runs past end of file")
}

fn read_f64_tensor(bytes: &[u8], data_start: usize, entry: &serde_json::Value) -> anyhow::Result<Vec<f64>> {
    let raw = tensor_bytes(bytes, data_start, entry)?;
    match entry["dtype"].as_str() {
        Some("F32") => Ok(raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect()),
        Some("F64") => Ok(raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect()),
        other => bail!("unsupported dtype {other:?} (expected F32 or F64)"),
    }
}

fn shape_of(entry: &serde_json::Value) -> anyhow::Result<Vec<usize>> {
    entry["shape"]
        .as_array()
        .context("tensor entry without shape")?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).context("non-integer shape"))
        .collect()
}

fn read_arr2(
    bytes: &[u8],
    data_start: usize,
    entry: &serde_json::Value,
    key: &str,
) -> anyhow::Result<Array2<f64>> {
    let shape = shape_of(entry)?;
    if shape.len() != 2 {
        bail!("'{key}' must be 2-D, got shape {shape:?}");
    }
    let vals = read_f64_tensor(bytes, data_start, entry)?;
    Array2::from_shape_vec((shape[0], shape[1]), vals).with_context(|| format!("'{key}' shape"))
}

// ── Public structs ────────────────────────────────────────────────────────────

/// Signal (and optionally channel positions) loaded from a safetensors file.
pub struct TopoInput {
    /// [T, C] signal, one column per channel.
    pub signal: Array2<f64>,
    /// [C, 2+] channel positions, if stored.
    pub chan_pos: Option<Array2<f64>>,
    /// Channel names (empty if not stored).
    pub ch_names: Vec<String>,
}

impl TopoInput {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let (header, data_start) = parse_header(&bytes)?;

        let data_entry = header.get("data").context("missing 'data' key")?;
        let signal = read_arr2(&bytes, data_start, data_entry, "data")?;

        let chan_pos = match header.get("chan_pos") {
            Some(e) => Some(read_arr2(&bytes, data_start, e, "chan_pos")?),
            None => None,
        };

        let ch_names = match header.get("ch_names") {
            Some(e) => std::str::from_utf8(tensor_bytes(&bytes, data_start, e)?)?
                .split('\n')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => vec![],
        };

        Ok(TopoInput { signal, chan_pos, ch_names })
    }

    /// Layout built from the stored `chan_pos` and `ch_names`.
    ///
    /// Channels without a stored name are called `ch0`, `ch1`, …
    pub fn layout(&self) -> anyhow::Result<ChannelLayout> {
        let pos = self.chan_pos.as_ref().context("file has no 'chan_pos' tensor")?;
        let names: Vec<String> = if self.ch_names.len() == pos.nrows() {
            self.ch_names.clone()
        } else {
            (0..pos.nrows()).map(|i| format!("ch{i}")).collect()
        };
        let layout = ChannelLayout::from_positions(&names, pos)?;
        if layout.len() != self.signal.ncols() {
            bail!(
                "chan_pos lists {} channels but signal has {}",
                layout.len(),
                self.signal.ncols()
            );
        }
        Ok(layout)
    }
}

// ── Generic safetensors builder ───────────────────────────────────────────────

/// Simple safetensors file writer for F32, F64, I32 and U8 tensors.
///
/// Usage:
/// ```rust,no_run
/// use topoplot::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64("raster", &[0.0, 1.0, 2.0, 3.0], &[2, 2]);
/// w.add_str("ch_names", &["Fz", "Cz"]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F32", shape.to_vec()));
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    /// RGB image as a `[H, W, 3]` U8 tensor.
    pub fn add_rgb(&mut self, name: &str, img: &RgbImage) {
        let (w, h) = img.dimensions();
        self.entries
            .push((name.to_string(), img.as_raw().clone(), "U8", vec![h as usize, w as usize, 3]));
    }

    /// Newline-joined UTF-8 strings, stored as U8.
    pub fn add_str(&mut self, name: &str, items: &[&str]) {
        let bytes = items.join("\n").into_bytes();
        let n = bytes.len();
        self.entries.push((name.to_string(), bytes, "U8", vec![n]));
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── PNG ───────────────────────────────────────────────────────────────────────

/// Encode `img` as PNG at `path`.
pub fn save_png(img: &RgbImage, path: &Path) -> Result<(), TopoError> {
    img.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn round_trip_signal_positions_and_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.safetensors");

        let mut w = StWriter::new();
        w.add_f32("data", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        w.add_f32("chan_pos", &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], &[3, 2]);
        w.add_str("ch_names", &["A", "B", "C"]);
        w.write(&path).unwrap();

        let input = TopoInput::load(&path).unwrap();
        assert_eq!(input.signal, array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(input.ch_names, ["A", "B", "C"]);
        let layout = input.layout().unwrap();
        assert_eq!(layout.get("B"), Some([1.0, 0.0]));
    }

    #[test]
    fn missing_names_fall_back_to_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.safetensors");

        let mut w = StWriter::new();
        w.add_f64("data", &[0.5, 0.25], &[1, 2]);
        w.add_f32("chan_pos", &[-1.0, 0.0, 1.0, 2.0], &[2, 2]);
        w.write(&path).unwrap();

        let layout = TopoInput::load(&path).unwrap().layout().unwrap();
        let names: Vec<&str> = layout.names().collect();
        assert_eq!(names, ["ch0", "ch1"]);
    }

    #[test]
    fn oversized_header_length_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.safetensors");
        let mut bytes = (u64::MAX - 2).to_le_bytes().to_vec();
        bytes.extend_from_slice(b"{}");
        std::fs::write(&path, &bytes).unwrap();
        assert!(TopoInput::load(&path).is_err());
    }

    #[test]
    fn data_offsets_past_usize_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.safetensors");
        let header = format!(
            r#"{{"data":{{"dtype":"F64","shape":[1,1],"data_offsets":[{},{}]}}}}"#,
            u64::MAX - 1,
            u64::MAX
        );
        let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        std::fs::write(&path, &bytes).unwrap();
        assert!(TopoInput::load(&path).is_err());

        let reversed = r#"{"data":{"dtype":"F64","shape":[1,1],"data_offsets":[8,0]}}"#;
        let mut bytes = (reversed.len() as u64).to_le_bytes().to_vec();
        bytes.extend_from_slice(reversed.as_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        std::fs::write(&path, &bytes).unwrap();
        assert!(TopoInput::load(&path).is_err());
    }

    #[test]
    fn missing_data_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.safetensors");
        let mut w = StWriter::new();
        w.add_i32("n", &[1], &[1]);
        w.write(&path).unwrap();
        assert!(TopoInput::load(&path).is_err());
    }
}
