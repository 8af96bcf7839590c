//! Defines command-line interface options using `clap` for the voxstack application.

use clap::Parser;
use std::path::PathBuf;
use voxstack::aggregate::DEFAULT_BINS;
use voxstack::NormalizationMode;

/// Aggregate co-registered images voxel by voxel
#[derive(Parser, Debug)]
#[command(
    version,
    name = "voxstack",
    about = "Aggregates multiple co-registered images into a single output image",
    long_about = "Aggregates multiple (co-registered) input images into a single output image, \
                  evaluating a statistic of the intensity samples found at each voxel in all \
                  input images. The input images have to be defined on the same voxel grid."
)]
pub struct Args {
    /// Aggregation function: mean, median, sd, gini, theil, entropy-index (ge) or entropy
    pub mode: String,

    /// At least two input images (NetCDF)
    #[arg(required = true, num_args = 2..)]
    pub images: Vec<PathBuf>,

    /// Voxel-wise aggregate image
    #[arg(short, long)]
    pub output: PathBuf,

    /// Name of the input variable; defaults to the first data variable of each file
    #[arg(long)]
    pub variable: Option<String>,

    /// Name of the output variable
    #[arg(long, default_value = voxstack::netcdf_io::DEFAULT_OUTPUT_VARIABLE)]
    pub output_variable: String,

    /// Background value of input voxels to be ignored
    #[arg(long, allow_negative_numbers = true)]
    pub padding: Option<f64>,

    /// Input intensity normalization: none, mean, median, z-score or unit (flag alone: z-score)
    #[arg(
        long,
        visible_alias = "normalize",
        num_args = 0..=1,
        default_value = "none",
        default_missing_value = "z-score",
        value_parser = parse_normalization_arg
    )]
    pub normalization: NormalizationMode,

    /// Alpha of the generalized entropy index (0: mean log deviation, 1: Theil, 2: half squared CV)
    #[arg(long, default_value_t = 0.0)]
    pub alpha: f64,

    /// No. of bins used for histogram-based aggregation functions
    #[arg(long, default_value_t = DEFAULT_BINS)]
    pub bins: usize,

    /// Use Parzen window based histogram estimation [yes|no|on|off]
    #[arg(
        long,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value = "no",
        default_missing_value = "yes",
        value_parser = parse_bool_arg
    )]
    pub parzen: bool,

    /// Exclude every voxel where any input equals the padding value [yes|no|on|off]
    #[arg(
        long,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value = "no",
        default_missing_value = "yes",
        value_parser = parse_bool_arg
    )]
    pub intersection: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Increase logging verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_bool_arg(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "yes" | "on" | "true" | "1" => Ok(true),
        "no" | "off" | "false" | "0" => Ok(false),
        _ => Err(format!("Invalid boolean value '{s}': expected yes, no, on or off")),
    }
}

fn parse_normalization_arg(s: &str) -> Result<NormalizationMode, String> {
    s.parse::<NormalizationMode>().map_err(|e| e.to_string())
}
