//! Entry point for the voxstack application.
//! Handles CLI parsing, image loading, and dispatches the voxel-wise aggregation.

use clap::Parser;
use flexi_logger::Logger;
use std::process::ExitCode;
use std::sync::Arc;
use voxstack::prelude::*;
use voxstack::get_parallel_info;

mod cli;

use cli::Args;

fn setup_logging(verbose: u8) -> std::result::Result<flexi_logger::LoggerHandle, String> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    Logger::try_with_env_or_str(level)
        .and_then(|logger| logger.start())
        .map_err(|e| format!("Logger initialization failed: {e}"))
}

fn execute(args: &Args) -> Result<()> {
    let threads = ParallelConfig::new(args.threads).setup_global_pool()?;
    get_parallel_info().log_info();
    if args.verbose > 0 {
        println!("🧵 Using {threads} threads");
    }

    let mode = AggregationMode::parse(&args.mode, args.alpha, args.bins, args.parzen)?;
    let policy = if args.intersection {
        CompositingPolicy::Intersection
    } else {
        CompositingPolicy::Union
    };
    let config = AggregationConfig::new(mode)
        .with_normalization(args.normalization)
        .with_padding(args.padding)
        .with_policy(policy);

    // Read input images
    println!("📂 Reading {} images...", args.images.len());
    let volumes = args
        .images
        .iter()
        .map(|path| load_volume(path, args.variable.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    let progress: ProgressCallback = if args.verbose > 0 {
        Some(Arc::new(|p: AggregationProgress| {
            if p.current == 0 {
                println!("⚡ {:?}...", p.stage);
            }
        }))
    } else {
        None
    };

    let output = voxstack::pipeline::run(&config, volumes, &progress)?;

    VolumeWriter::new(&args.output)
        .with_variable(&args.output_variable)
        .with_attribute("aggregation", mode.to_string())
        .with_attribute("normalization", config.normalization.as_str())
        .with_attribute("compositing", policy.to_string())
        .write(&output)?;
    println!("✅ Saved result to {}", args.output.display());

    Ok(())
}

fn main() -> ExitCode {
    // Parse command-line arguments
    let args = Args::parse();

    // Keep the handle alive for the duration of the run
    let _logger = match setup_logging(args.verbose) {
        Ok(handle) => Some(handle),
        Err(msg) => {
            eprintln!("⚠ {msg}");
            None
        }
    };

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            ExitCode::FAILURE
        }
    }
}
