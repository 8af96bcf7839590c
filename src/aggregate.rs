//! Voxel-wise aggregation of the input stack
//!
//! For every evaluated output voxel, the values of the inputs that are
//! foreground there are gathered into a sample array and reduced by the
//! function selected with [`AggregationMode`]. The output buffer is split into
//! disjoint chunks that are processed in parallel, each with its own scratch
//! sample array.

use crate::errors::{Result, VoxStackError};
use crate::statistics::{dispersion, elementary, histogram, Alpha};
use crate::volume::Volume;
use log::debug;
use rayon::prelude::*;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Number of output voxels handled by one parallel work item
const CHUNK_SIZE: usize = 4096;

/// Default number of histogram bins for Shannon entropy
pub const DEFAULT_BINS: usize = 64;

/// Output background for dispersion and entropy modes
const DISPERSION_BACKGROUND: f32 = 1e-3;

/// Margin below the output minimum used for unresolved voxels
const UNRESOLVED_MARGIN: f32 = 1e-3;

/// Function used to aggregate the samples at each voxel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregationMode {
    /// Mean value
    Mean,
    /// Median value
    Median,
    /// Population standard deviation
    StandardDeviation,
    /// Gini coefficient in [0, 1]
    Gini,
    /// Theil index, equivalent to GE(1)
    Theil,
    /// Generalized entropy index GE(alpha)
    GeneralizedEntropyIndex(Alpha),
    /// Shannon entropy of a fixed-bin histogram, optionally smoothed
    ShannonEntropy { bins: NonZeroUsize, smooth: bool },
}

impl AggregationMode {
    /// Parse a mode name, attaching the parameters used by the modes that take any.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown name, a negative `alpha` or zero `bins`.
    pub fn parse(name: &str, alpha: f64, bins: usize, smooth: bool) -> Result<Self> {
        let mode = match name.to_lowercase().as_str() {
            "mean" | "mu" | "average" | "avg" => Self::Mean,
            "median" => Self::Median,
            "stddev" | "stdev" | "sdev" | "sd" | "sigma" => Self::StandardDeviation,
            "gini" | "gini-coefficient" => Self::Gini,
            "theil" | "theil-index" => Self::Theil,
            "entropy-index" | "ge" | "generalized-entropy-index" => {
                Self::GeneralizedEntropyIndex(Alpha::new(alpha)?)
            }
            "entropy" | "shannon-entropy" => {
                let bins = NonZeroUsize::new(bins).ok_or_else(|| {
                    VoxStackError::InvalidArgument(
                        "number of histogram bins must be positive".to_string(),
                    )
                })?;
                Self::ShannonEntropy { bins, smooth }
            }
            _ => {
                return Err(VoxStackError::InvalidMode {
                    kind: "aggregation",
                    value: name.to_string(),
                })
            }
        };
        Ok(mode)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::StandardDeviation => "stddev",
            Self::Gini => "gini",
            Self::Theil => "theil",
            Self::GeneralizedEntropyIndex(_) => "entropy-index",
            Self::ShannonEntropy { .. } => "entropy",
        }
    }

    /// Whether the inputs must be shifted to strictly positive values first
    #[must_use]
    pub const fn requires_positive(&self) -> bool {
        matches!(
            self,
            Self::Gini | Self::Theil | Self::GeneralizedEntropyIndex(_)
        )
    }

    /// Background value of the output volume.
    ///
    /// NaN for the mean, so unresolved voxels are told apart from near-zero
    /// dispersion values.
    #[must_use]
    pub fn output_background(&self) -> f32 {
        match self {
            Self::Mean => f32::NAN,
            _ => DISPERSION_BACKGROUND,
        }
    }

    /// Aggregate one voxel's samples.
    ///
    /// Dispersion measures consume `samples` (see [`dispersion`]).
    pub fn evaluate(&self, samples: &mut [f64]) -> f64 {
        match *self {
            Self::Mean => elementary::mean(samples, None),
            Self::Median => elementary::median(samples, None),
            Self::StandardDeviation => elementary::stddev(samples, None),
            Self::Gini => dispersion::gini(samples),
            Self::Theil => dispersion::theil_index(samples),
            Self::GeneralizedEntropyIndex(alpha) => dispersion::generalized_entropy(samples, alpha),
            Self::ShannonEntropy { bins, smooth } => {
                histogram::shannon_entropy(samples, bins, smooth)
            }
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeneralizedEntropyIndex(alpha) => write!(f, "GE({})", alpha.value()),
            Self::ShannonEntropy { bins, smooth } => {
                write!(f, "entropy (bins = {bins}, smoothed = {smooth})")
            }
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for AggregationMode {
    type Err = VoxStackError;

    /// Parse with default parameters: alpha 0, 64 bins, no smoothing
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, 0.0, DEFAULT_BINS, false)
    }
}

/// Evaluate `mode` at every foreground voxel of `output`.
///
/// Samples at a voxel come from the inputs that are foreground there, in input
/// order. Background output voxels keep their value. Returns the number of
/// evaluated voxels.
pub fn aggregate_voxels(
    volumes: &[Volume<f64>],
    output: &mut Volume<f32>,
    mode: AggregationMode,
) -> usize {
    let background = output.background_value();
    let is_background = |v: f32| v.is_nan() || v == background;

    debug!(
        "Evaluating {} over {} voxels across {} threads",
        mode,
        output.number_of_voxels(),
        rayon::current_num_threads()
    );

    output
        .values_mut()
        .par_chunks_mut(CHUNK_SIZE)
        .enumerate()
        .map(|(chunk_idx, chunk)| {
            let start = chunk_idx * CHUNK_SIZE;
            let mut samples: Vec<f64> = Vec::with_capacity(volumes.len());
            let mut evaluated = 0;
            for (offset, value) in chunk.iter_mut().enumerate() {
                if is_background(*value) {
                    continue;
                }
                let vox = start + offset;
                samples.clear();
                samples.extend(
                    volumes
                        .iter()
                        .filter(|v| v.is_foreground(vox))
                        .map(|v| v.get(vox)),
                );
                #[allow(clippy::cast_possible_truncation)]
                {
                    *value = mode.evaluate(&mut samples) as f32;
                }
                evaluated += 1;
            }
            evaluated
        })
        .sum()
}

/// Replace NaN output voxels by a value just below the output minimum.
///
/// Returns the number of voxels replaced.
pub fn replace_unresolved(output: &mut Volume<f32>) -> usize {
    let floor = output.min_max().map_or(0.0, |(lo, _)| lo) - UNRESOLVED_MARGIN;
    let mut replaced = 0;
    for value in output.values_mut() {
        if value.is_nan() {
            *value = floor;
            replaced += 1;
        }
    }
    if replaced > 0 {
        debug!("Replaced {replaced} unresolved voxels by {floor}");
    }
    replaced
}
