//! Intensity normalization of input volumes
//!
//! Each volume is rescaled independently by an affine map derived from its
//! own foreground intensities. Background voxels are never modified.

use crate::errors::VoxStackError;
use crate::statistics::elementary;
use crate::volume::Volume;
use log::{debug, warn};
use std::fmt;
use std::str::FromStr;

/// Values closer to zero than this are treated as zero
const ZERO_TOLERANCE: f64 = 1e-12;

#[inline]
fn is_zero(value: f64) -> bool {
    value.abs() < ZERO_TOLERANCE
}

/// How each input volume is rescaled before aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationMode {
    /// Use input intensities unmodified
    #[default]
    None,
    /// Divide by the mean foreground value
    Mean,
    /// Divide by the median foreground value
    Median,
    /// Subtract the mean and divide by the standard deviation
    ZScore,
    /// Rescale foreground intensities to [0, 1]
    UnitRange,
}

impl NormalizationMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::ZScore => "z-score",
            Self::UnitRange => "unit",
        }
    }
}

impl fmt::Display for NormalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizationMode {
    type Err = VoxStackError;

    /// Accepts mode names as well as yes/no words, where "yes" selects z-score
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "no" | "off" | "false" => Ok(Self::None),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "zscore" | "z-score" | "yes" | "on" | "true" => Ok(Self::ZScore),
            "unit" | "unit-range" => Ok(Self::UnitRange),
            _ => Err(VoxStackError::InvalidMode {
                kind: "normalization",
                value: s.to_string(),
            }),
        }
    }
}

/// Affine intensity map `v -> scale * v + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMap {
    pub scale: f64,
    pub offset: f64,
}

impl AffineMap {
    pub const IDENTITY: AffineMap = AffineMap {
        scale: 1.0,
        offset: 0.0,
    };

    #[inline]
    pub fn apply(self, value: f64) -> f64 {
        self.scale * value + self.offset
    }

    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }
}

/// Derive the normalizing map from the masked sample values.
///
/// Zero mean, median, deviation or range fall back to a map that does not divide.
pub fn normalization_map(values: &[f64], mask: &[bool], mode: NormalizationMode) -> AffineMap {
    let mask = Some(mask);
    match mode {
        NormalizationMode::None => AffineMap::IDENTITY,
        NormalizationMode::Mean => {
            let mean = elementary::mean(values, mask);
            if mean.is_nan() || is_zero(mean) {
                AffineMap::IDENTITY
            } else {
                AffineMap {
                    scale: 1.0 / mean,
                    offset: 0.0,
                }
            }
        }
        NormalizationMode::Median => {
            let median = elementary::median(values, mask);
            if median.is_nan() || is_zero(median) {
                AffineMap::IDENTITY
            } else {
                AffineMap {
                    scale: 1.0 / median,
                    offset: 0.0,
                }
            }
        }
        NormalizationMode::ZScore => {
            let (mean, sigma) = elementary::normal_distribution(values, mask);
            if mean.is_nan() {
                AffineMap::IDENTITY
            } else if is_zero(sigma) {
                AffineMap {
                    scale: 1.0,
                    offset: -mean,
                }
            } else {
                AffineMap {
                    scale: 1.0 / sigma,
                    offset: -mean / sigma,
                }
            }
        }
        NormalizationMode::UnitRange => match elementary::extrema(values, mask) {
            None => AffineMap::IDENTITY,
            Some((min, max)) => {
                let range = max - min;
                if is_zero(range) {
                    AffineMap {
                        scale: 1.0,
                        offset: -min,
                    }
                } else {
                    AffineMap {
                        scale: 1.0 / range,
                        offset: -min / range,
                    }
                }
            }
        },
    }
}

/// Normalize the foreground intensities of `volume` in place.
///
/// Returns the map that was applied.
pub fn normalize(volume: &mut Volume<f64>, mode: NormalizationMode) -> AffineMap {
    if mode == NormalizationMode::None {
        return AffineMap::IDENTITY;
    }

    let mask = volume.foreground_mask();
    if !mask.iter().any(|&m| m) {
        warn!("{} has no foreground voxels, skipping {} normalization", volume.name(), mode);
        return AffineMap::IDENTITY;
    }

    let map = normalization_map(volume.values(), &mask, mode);
    debug!(
        "{} normalization of {}: scale = {}, offset = {}",
        mode,
        volume.name(),
        map.scale,
        map.offset
    );

    if !map.is_identity() {
        for (value, &fg) in volume.values_mut().iter_mut().zip(&mask) {
            if fg {
                *value = map.apply(*value);
            }
        }
    }
    map
}
