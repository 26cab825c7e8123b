/// topo_steps: run each topographic-plot step for one time sample and write
/// every intermediate array to a safetensors file for inspection.
///
/// Output keys:
///   signal         [T, C]     f64  input signal
///   normalized     [T, C]     f64  after per-channel min–max
///   col_min/max    [C]        f64  ranges used by the normaliser
///   grid_pos       [C, 2]     f64  grid-mapped channel cells (x, y)
///   raster         [H, W]     f64  sparse raster of sample `t`
///   interpolated   [H, W]     f64  after the row-wise spline fill
///   image          [IH, IW, 3] u8  rendered frame
///   ch_names       [n]        u8   newline-separated channel names
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use topoplot::{
    grid::map_to_grid,
    io::{StWriter, TopoInput},
    normalize::minmax_columns_inplace,
    raster::build_topo_matrix,
    render::render_image,
    spline::interpolate_rows,
    ChannelLayout, Palette,
};

#[derive(Parser, Debug)]
#[command(name = "topo_steps")]
struct Args {
    /// Input safetensors file.
    #[arg(long)]
    input: PathBuf,

    /// Output safetensors path.
    #[arg(long)]
    output: PathBuf,

    /// Optional .lout / .lay layout (otherwise `chan_pos` from the input).
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Time sample to rasterise.
    #[arg(long, default_value_t = 0)]
    t: usize,

    /// Raster width and height (square).
    #[arg(long, default_value_t = 64)]
    raster: usize,

    /// Image width and height (square).
    #[arg(long, default_value_t = 256)]
    image: u32,

    /// Colour map.
    #[arg(long, default_value_t = Palette::Jet)]
    palette: Palette,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let size = (args.raster, args.raster);

    // ── 1. Read input ──────────────────────────────────────────────────────
    let t_in = now();
    let input = TopoInput::load(&args.input)?;
    let layout = match &args.layout {
        Some(p) if input.ch_names.is_empty() => ChannelLayout::from_layout_file(p)?,
        Some(p) => ChannelLayout::from_layout_file(p)?.select(&input.ch_names),
        None => input.layout()?,
    };
    let ms_in = t_in.elapsed().as_secs_f64() * 1000.0;

    // ── 2. Grid mapping ────────────────────────────────────────────────────
    let t_grid = now();
    let layout_px = map_to_grid(&layout, size)?;
    let ms_grid = t_grid.elapsed().as_secs_f64() * 1000.0;

    // ── 3. Normalise ───────────────────────────────────────────────────────
    let t_norm = now();
    let mut normalized = input.signal.clone();
    let ranges = minmax_columns_inplace(&mut normalized);
    let ms_norm = t_norm.elapsed().as_secs_f64() * 1000.0;

    // ── 4. Raster ──────────────────────────────────────────────────────────
    let t_ras = now();
    let raster = build_topo_matrix(&normalized, &layout_px, size, args.t);
    let ms_ras = t_ras.elapsed().as_secs_f64() * 1000.0;

    // ── 5. Spline fill ─────────────────────────────────────────────────────
    let t_spl = now();
    let interpolated = interpolate_rows(&raster);
    let ms_spl = t_spl.elapsed().as_secs_f64() * 1000.0;

    // ── 6. Render ──────────────────────────────────────────────────────────
    let t_img = now();
    let img = render_image(&interpolated, (args.image, args.image), args.palette);
    let ms_img = t_img.elapsed().as_secs_f64() * 1000.0;

    eprintln!(
        "TIMING input={ms_in:.4}ms grid={ms_grid:.4}ms normalize={ms_norm:.4}ms \
         raster={ms_ras:.4}ms spline={ms_spl:.4}ms render={ms_img:.4}ms",
    );
    eprintln!(
        "  {} ch  {} samples  t={}  raster {}x{}",
        layout.len(),
        input.signal.nrows(),
        args.t,
        args.raster,
        args.raster
    );

    // ── 7. Write output ────────────────────────────────────────────────────
    eprintln!("Writing → {}", args.output.display());
    let mut w = StWriter::new();
    w.add_f64_arr2("signal", &input.signal);
    w.add_f64_arr2("normalized", &normalized);

    let n_ch = ranges.len();
    let (mins, maxs): (Vec<f64>, Vec<f64>) = ranges.into_iter().unzip();
    w.add_f64("col_min", &mins, &[n_ch]);
    w.add_f64("col_max", &maxs, &[n_ch]);

    let grid: Vec<f64> = layout_px.positions().flatten().collect();
    w.add_f64("grid_pos", &grid, &[layout_px.len(), 2]);

    w.add_f64_arr2("raster", &raster);
    w.add_f64_arr2("interpolated", &interpolated);
    w.add_rgb("image", &img);

    let names: Vec<&str> = layout_px.names().collect();
    w.add_str("ch_names", &names);
    w.write(&args.output)?;

    eprintln!("Done.");
    Ok(())
}

/// Return `std::time::Instant::now()` (used for internal timing).
#[inline(always)]
fn now() -> std::time::Instant { std::time::Instant::now() }
