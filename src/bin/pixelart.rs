use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pixel_art_studio_wasm::{pixelate_bytes, BlockMode, Params, Session};

/// Convert images to pixel art (native wrapper around the library core).
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Block size in pixels (1-20)
    #[arg(short, long, default_value_t = 7)]
    block_size: u32,

    /// Palette size (even, 4-32)
    #[arg(short = 'k', long, default_value_t = 8)]
    palette_size: usize,

    /// Rotation in degrees (0/90/180/270), applied before processing
    #[arg(short, long, default_value_t = 0)]
    rotation: u32,

    /// Sobel edge threshold (0-100)
    #[arg(long, default_value_t = 15)]
    edge_threshold: u32,

    /// Grid line width (0-5)
    #[arg(long, default_value_t = 1)]
    grid_line_width: u32,

    /// Convert the palette-snapped output to grayscale
    #[arg(long)]
    grayscale: bool,

    /// Draw grid lines over block boundaries
    #[arg(long)]
    grid_lines: bool,

    /// Apply Sobel edge detection after quantization
    #[arg(long)]
    edges: bool,

    /// Use the dominant block color instead of the average
    #[arg(long)]
    dominant: bool,

    /// Seed for k-means++ centroid seeding (reproducible palettes)
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory (created if missing); defaults to the current dir
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,

    /// Print palette and summary as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let params = Params {
        block_size: args.block_size,
        palette_size: args.palette_size,
        edge_threshold: args.edge_threshold,
        grid_line_width: args.grid_line_width,
        grayscale: args.grayscale,
        grid_lines: args.grid_lines,
        edge_detection: args.edges,
        block_mode: if args.dominant {
            BlockMode::Dominant
        } else {
            BlockMode::Average
        },
        confirmation_mode: false,
    };

    for input in &args.inputs {
        let bytes =
            fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let (png, palette, info) = pixelate_bytes(&bytes, args.rotation, params, args.seed)
            .with_context(|| format!("converting {}", input.display()))?;

        let dir = args.out_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)?;
        let out_path = unique_path(&dir, Session::export_file_name());
        fs::write(&out_path, png)?;

        if args.json {
            println!(
                "{}",
                serde_json::json!({
                    "input": input.display().to_string(),
                    "output": out_path.display().to_string(),
                    "palette": palette,
                    "info": info,
                })
            );
        } else {
            println!("{info}");
            for (i, hex) in palette.iter().enumerate() {
                println!("  color {}: #{hex}", i + 1);
            }
            println!("Saved → {}", out_path.display());
        }
    }

    Ok(())
}

/// Avoid clobbering when several inputs land in the same millisecond.
fn unique_path(dir: &PathBuf, name: String) -> PathBuf {
    let mut path = dir.join(&name);
    let mut n = 1;
    while path.exists() {
        let stem = name.trim_end_matches(".png");
        path = dir.join(format!("{stem}-{n}.png"));
        n += 1;
    }
    path
}
