//! Resin slicer CLI.
//!
//! Usage:
//!   resin-slicer slice <input.stl> -o <output.goo> [options]
//!   resin-slicer slice <input.stl> --config profile.json
//!   resin-slicer info <input.stl>

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, LevelFilter};
use resin_slicer::{load_stl, JobConfig, Pipeline, PipelineStage};
use std::path::PathBuf;

/// A mesh-to-GOO slicer for mask-projection resin printers
#[derive(Parser, Debug)]
#[command(name = "resin-slicer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Slice an STL file and generate a GOO job file
    Slice {
        /// Input STL file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output GOO file (defaults to the input with a .goo extension)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Job configuration file (JSON format)
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Layer height in mm
        #[arg(long, default_value = "0.05")]
        layer_height: f64,

        /// Mask width in pixels
        #[arg(long, default_value = "1440")]
        x_resolution: u16,

        /// Mask height in pixels
        #[arg(long, default_value = "2560")]
        y_resolution: u16,

        /// Enable grid infill with the given density (0-100)
        #[arg(long, value_name = "DENSITY")]
        infill: Option<u32>,

        /// Number of threads to use (0 = auto)
        #[arg(short = 'j', long, default_value = "0")]
        threads: usize,
    },

    /// Display information about an STL file
    Info {
        /// Input STL file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Slice {
            input,
            output,
            config,
            layer_height,
            x_resolution,
            y_resolution,
            infill,
            threads,
        } => cmd_slice(
            input,
            output,
            config,
            layer_height,
            x_resolution,
            y_resolution,
            infill,
            threads,
        ),
        Commands::Info { input } => cmd_info(input),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_slice(
    input: PathBuf,
    output: Option<PathBuf>,
    config_file: Option<PathBuf>,
    layer_height: f64,
    x_resolution: u16,
    y_resolution: u16,
    infill: Option<u32>,
    threads: usize,
) -> Result<()> {
    let output_path = output.unwrap_or_else(|| input.with_extension("goo"));

    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to initialize thread pool")?;
    }

    let progress = ProgressBar::new(100);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    progress.set_message("Loading mesh...");
    let mesh = load_stl(&input).context("Failed to load STL file")?;

    info!("Mesh loaded:");
    info!("  Triangles: {}", mesh.triangle_count());
    let bb = mesh.bounding_box();
    info!(
        "  Bounding box: ({:.2}, {:.2}, {:.2}) - ({:.2}, {:.2}, {:.2})",
        bb.min.x, bb.min.y, bb.min.z, bb.max.x, bb.max.y, bb.max.z
    );

    let config = if let Some(config_path) = config_file {
        info!("Loading job config from: {}", config_path.display());
        JobConfig::from_file(&config_path).context("Failed to load job config file")?
    } else {
        let mut config = JobConfig::default()
            .layer_height(layer_height)
            .resolution(x_resolution, y_resolution);
        if let Some(density) = infill {
            config = config.with_infill(f64::from(density) / 100.0);
        }
        config
    };

    let pipeline = Pipeline::new(config);
    let summary = pipeline
        .export_to_file_with(
            &mesh,
            &output_path,
            |stage, fraction| {
                let (base, span) = match stage {
                    PipelineStage::Slicing => (0, 30),
                    PipelineStage::Rasterizing => (30, 60),
                    PipelineStage::Assembling => (90, 5),
                    PipelineStage::Writing => (95, 5),
                };
                progress.set_position(base + (fraction * f64::from(span)) as u64);
                progress.set_message(stage.to_string());
            },
            None,
        )
        .context("Slicing failed")?;

    progress.finish_with_message("done");

    println!("Wrote {}", output_path.display());
    println!("  Layers: {}", summary.layer_count);
    println!("  File size: {} bytes", summary.file_bytes);
    println!("  Estimated resin: {:.2} cm³", summary.volume_cm3);
    if summary.degenerate_layers > 0 {
        println!(
            "  Warning: {} layers produced no valid contours",
            summary.degenerate_layers
        );
    }
    println!(
        "  Estimated print time: {}m {}s",
        summary.printing_time_s / 60,
        summary.printing_time_s % 60
    );

    Ok(())
}

fn cmd_info(input: PathBuf) -> Result<()> {
    info!("Loading STL file: {}", input.display());

    let mesh = load_stl(&input).context("Failed to load STL file")?;

    let bb = mesh.bounding_box();
    let size = bb.size();

    println!("Mesh Information:");
    println!("  File: {}", input.display());
    println!("  Triangles: {}", mesh.triangle_count());
    println!("  Bounding box:");
    println!(
        "    Min: ({:.3}, {:.3}, {:.3}) mm",
        bb.min.x, bb.min.y, bb.min.z
    );
    println!(
        "    Max: ({:.3}, {:.3}, {:.3}) mm",
        bb.max.x, bb.max.y, bb.max.z
    );
    println!("    Size: {:.3} x {:.3} x {:.3} mm", size.x, size.y, size.z);

    println!("  Estimated layers:");
    for lh in [0.025, 0.05, 0.1] {
        let layers = (size.z / lh).ceil() as u32;
        println!("    At {:.3}mm layer height: {} layers", lh, layers);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
