//! noisemap CLI - generate grayscale noise maps from a JSON layer description.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use noisemap::export::{
    BmpExportError, PngExportError, PngExportOptions, expected_bmp_size, export_map_set_bmp,
    export_map_set_png,
};
use noisemap::maps::{ConfigError, LayerKind, MapError, MapSetConfig, generate_map_set};
use noisemap::noise::LaneWidth;

/// Batched gradient and cellular noise map generator.
#[derive(Parser)]
#[command(name = "noisemap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every layer of a map set and export it.
    Generate {
        /// JSON map-set description. Uses the built-in terrain preset if omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "map")]
        name: String,

        /// Export format.
        #[arg(short, long, default_value = "bmp")]
        format: ExportFormat,

        /// Seed override for reproducible generation.
        #[arg(short, long, allow_negative_numbers = true)]
        seed: Option<i32>,

        /// Lane width override.
        #[arg(long)]
        lane_width: Option<LaneArg>,
    },

    /// Display information about a map-set configuration.
    Info {
        /// JSON map-set description. Uses the built-in terrain preset if omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    /// Uncompressed 24-bit BMP.
    Bmp,
    /// 8-bit grayscale PNG.
    Png,
}

#[derive(Clone, Copy, ValueEnum)]
enum LaneArg {
    /// One sample at a time.
    Scalar,
    /// Four samples per lane.
    Four,
    /// Eight samples per lane.
    Eight,
}

impl From<LaneArg> for LaneWidth {
    fn from(arg: LaneArg) -> Self {
        match arg {
            LaneArg::Scalar => LaneWidth::Scalar,
            LaneArg::Four => LaneWidth::Four,
            LaneArg::Eight => LaneWidth::Eight,
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("BMP export failed: {0}")]
    Bmp(#[from] BmpExportError),
    #[error("PNG export failed: {0}")]
    Png(#[from] PngExportError),
}

const PRESET_SIZE: u32 = 512;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            config,
            output,
            name,
            format,
            seed,
            lane_width,
        } => run_generate(config.as_deref(), &output, &name, format, seed, lane_width),
        Commands::Info { config } => run_info(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<MapSetConfig, ConfigError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            MapSetConfig::from_path(path)
        }
        None => {
            info!("No configuration given, using the terrain preset");
            Ok(MapSetConfig::terrain(PRESET_SIZE, PRESET_SIZE))
        }
    }
}

fn run_generate(
    config_path: Option<&Path>,
    output: &Path,
    name: &str,
    format: ExportFormat,
    seed: Option<i32>,
    lane_width: Option<LaneArg>,
) -> Result<(), CliError> {
    let mut config = load_config(config_path)?;
    if let Some(seed) = seed {
        config.seed = Some(seed);
    }
    if let Some(lane_width) = lane_width {
        config.lane_width = lane_width.into();
    }

    let start = Instant::now();
    let set = generate_map_set(&config)?;
    for layer in &set.layers {
        info!(layer = %layer.name, min = layer.min, max = layer.max, "Layer range");
    }
    info!(seed = set.seed, elapsed = ?start.elapsed(), "Generation completed");

    let export_start = Instant::now();
    let written = match format {
        ExportFormat::Bmp => export_map_set_bmp(&set, output, name)?,
        ExportFormat::Png => export_map_set_png(&set, output, name, &PngExportOptions::default())?,
    };
    for path in &written {
        info!(path = %path.display(), "Exported");
    }
    info!(
        files = written.len(),
        elapsed = ?export_start.elapsed(),
        "Export completed"
    );

    Ok(())
}

fn run_info(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    config.validate()?;

    let pixels = config.pixel_count() as u64;
    let bmp_size = expected_bmp_size(config.width, config.height);
    let layer_count = config.layers.len() as u64;

    println!("noisemap - Map Set Info");
    println!("=======================");
    println!();
    println!("Grid:       {}x{} ({} samples)", config.width, config.height, pixels);
    match config.seed {
        Some(seed) => println!("Seed:       {}", seed),
        None => println!("Seed:       random per run"),
    }
    println!(
        "Lanes:      {} ({} samples per lane)",
        config.lane_width.name(),
        config.lane_width.width()
    );
    println!();
    println!("Layers:");
    for (index, layer) in config.layers.iter().enumerate() {
        let detail = match layer.kind {
            LayerKind::Gradient2d { amplitude, mode } => {
                format!("amplitude {amplitude}, {}", mode.name())
            }
            LayerKind::Gradient3d { amplitude, mode, depth } => {
                format!("amplitude {amplitude}, {}, depth {depth}", mode.name())
            }
            LayerKind::Cellular2d { center_amplitude, edge_amplitude, output } => {
                format!("center {center_amplitude}, edge {edge_amplitude}, keeps {output:?}")
            }
            LayerKind::Cellular3d { center_amplitude, edge_amplitude, output, depth } => format!(
                "center {center_amplitude}, edge {edge_amplitude}, keeps {output:?}, depth {depth}"
            ),
        };
        println!(
            "  {:<12} {:<10} freq {:?}, seed offset {}, {}",
            layer.name,
            layer.kind.name(),
            layer.frequency,
            layer.seed_offset(index),
            detail
        );
        if let Some(mask) = &layer.land_mask {
            println!("  {:<12} masked where '{}' < {}", "", mask.source, mask.sea_level);
        }
    }
    println!();
    println!("Memory usage (in-memory):");
    println!(
        "  Values (f32):   {:>12} bytes per layer while evaluating",
        pixels * 4
    );
    println!("  Bytes (u8):     {:>12} bytes total", pixels * layer_count);
    println!();
    println!("Export file sizes:");
    println!(
        "  BMP (24-bit):   {:>12} bytes ({:.2} MB) - {} files",
        bmp_size * layer_count,
        (bmp_size * layer_count) as f64 / 1024.0 / 1024.0,
        layer_count
    );
    println!(
        "  PNG (8-bit):    {:>12} bytes at most before compression - {} files",
        pixels * layer_count,
        layer_count
    );

    Ok(())
}
