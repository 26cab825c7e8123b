use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use topoplot::{
    io::{save_png, TopoInput},
    topoplot, ChannelLayout, Palette, TopoConfig,
};

#[derive(Parser)]
#[command(name = "topoplot", about = "Render topographic MEG/EEG maps to PNG frames")]
struct Args {
    /// Signal safetensors file (`data` [T, C], optional `chan_pos`, `ch_names`)
    #[arg(long)]
    input: PathBuf,

    /// Directory receiving frame_00000.png, frame_00001.png, …
    #[arg(long)]
    output_dir: PathBuf,

    /// MNE .lout / .lay layout; defaults to `chan_pos` from the input file
    #[arg(long)]
    layout: Option<PathBuf>,

    /// JSON config file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raster size, e.g. 64x64
    #[arg(long, value_parser = parse_size::<usize>)]
    raster: Option<(usize, usize)>,

    /// Image size in pixels, e.g. 256x256
    #[arg(long, value_parser = parse_size::<u32>)]
    image: Option<(u32, u32)>,

    /// jet, hot, hot-neg1, hot-neg2, bone, redblue
    #[arg(long)]
    palette: Option<Palette>,

    /// Skip the spline fill
    #[arg(long)]
    no_interp: bool,

    /// Skip per-channel min–max normalisation
    #[arg(long)]
    no_normalize: bool,

    /// First time sample to render
    #[arg(long)]
    start: Option<usize>,

    /// One past the last time sample to render
    #[arg(long)]
    end: Option<usize>,
}

fn parse_size<T>(s: &str) -> Result<(T, T), String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w.trim().parse().map_err(|e| format!("width '{w}': {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("height '{h}': {e}"))?;
    Ok((w, h))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<TopoConfig>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => TopoConfig::default(),
    };
    if let Some(r) = args.raster {
        cfg.raster_size = r;
    }
    if let Some(i) = args.image {
        cfg.image_size = i;
    }
    if let Some(p) = args.palette {
        cfg.palette = p;
    }
    cfg.interpolate &= !args.no_interp;
    cfg.normalize &= !args.no_normalize;
    if args.start.is_some() || args.end.is_some() {
        cfg.samples = Some(args.start.unwrap_or(0)..args.end.unwrap_or(usize::MAX));
    }

    let input = TopoInput::load(&args.input)?;
    log::info!(
        "loaded {} samples × {} channels from {}",
        input.signal.nrows(),
        input.signal.ncols(),
        args.input.display()
    );

    let layout = match &args.layout {
        Some(path) => {
            let full = ChannelLayout::from_layout_file(path)?;
            if input.ch_names.is_empty() {
                full
            } else {
                full.select(&input.ch_names)
            }
        }
        None => input.layout()?,
    };
    if layout.len() != input.signal.ncols() {
        bail!(
            "layout resolves {} of the signal's {} channels",
            layout.len(),
            input.signal.ncols()
        );
    }

    let frames = topoplot(&layout, &input.signal, &cfg)?;
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let first = cfg.sample_range(input.signal.nrows()).start;
    for (i, img) in frames.iter().enumerate() {
        let path = args.output_dir.join(format!("frame_{:05}.png", first + i));
        save_png(img, &path)?;
    }
    log::info!(
        "wrote {} frames ({} palette, {}x{}) → {}",
        frames.len(),
        cfg.palette,
        cfg.image_size.0,
        cfg.image_size.1,
        args.output_dir.display()
    );

    Ok(())
}
