//! Measures of dispersion and inequality
//!
//! Both the Gini coefficient and the generalized entropy index consume their
//! input: samples are shifted to be strictly positive when the minimum is not,
//! and [`gini`] additionally sorts them ascending. Pass a scratch copy if the
//! original values are still needed.

use crate::errors::{Result, VoxStackError};
use num_traits::{Num, NumCast};

/// Scalar sample type accepted by the dispersion measures
pub trait Sample: Copy + PartialOrd + Num + NumCast {
    /// Margin kept above zero when shifting samples to be strictly positive
    fn shift_epsilon() -> Self;
}

macro_rules! impl_float_sample {
    ($($t:ty),*) => {
        $(impl Sample for $t {
            #[inline]
            fn shift_epsilon() -> Self {
                1e-6
            }
        })*
    };
}

macro_rules! impl_integer_sample {
    ($($t:ty),*) => {
        $(impl Sample for $t {
            #[inline]
            fn shift_epsilon() -> Self {
                1
            }
        })*
    };
}

impl_float_sample!(f32, f64);
impl_integer_sample!(i16, i32, i64);

/// Exponent of the generalized entropy index, guaranteed non-negative
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Alpha(f64);

impl Alpha {
    /// GE(0), the mean log deviation
    pub const MEAN_LOG_DEVIATION: Alpha = Alpha(0.0);
    /// GE(1), the Theil index
    pub const THEIL: Alpha = Alpha(1.0);
    /// GE(2), half the squared coefficient of variation
    pub const HALF_SQUARED_CV: Alpha = Alpha(2.0);

    /// # Errors
    ///
    /// Returns [`VoxStackError::InvalidArgument`] if `value` is negative or NaN.
    pub fn new(value: f64) -> Result<Self> {
        if value >= 0.0 && value.is_finite() {
            Ok(Self(value))
        } else {
            Err(VoxStackError::InvalidArgument(format!(
                "alpha must be non-negative, got {value}"
            )))
        }
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

#[inline]
fn as_f64<T: Sample>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Shift samples so that all of them are strictly positive.
///
/// Leaves the samples untouched when the minimum is already positive.
pub fn shift_to_positive<T: Sample>(samples: &mut [T]) {
    let Some(min) = samples
        .iter()
        .copied()
        .reduce(|a, b| if b < a { b } else { a })
    else {
        return;
    };
    if min <= T::zero() {
        let shift = min - T::shift_epsilon();
        for v in samples.iter_mut() {
            *v = *v - shift;
        }
    }
}

fn all_equal<T: Sample>(samples: &[T]) -> bool {
    samples.windows(2).all(|w| w[0] == w[1])
}

/// Gini coefficient of the sample distribution.
///
/// Returns a value in [0, 1): 0 when all samples are equal, approaching 1 when
/// a single sample holds the whole sum. An empty sample set yields 0.
///
/// Shifts the samples to be strictly positive and sorts them ascending.
pub fn gini<T: Sample>(samples: &mut [T]) -> f64 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }
    shift_to_positive(samples);
    samples.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if all_equal(samples) {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let nf = n as f64;
    let mut weighted = 0.0_f64;
    let mut total = 0.0_f64;
    for (i, &v) in samples.iter().enumerate() {
        let v = as_f64(v);
        // zero-based rank: 2 * (i + 1) - n - 1 == 2 * i - n + 1
        #[allow(clippy::cast_precision_loss)]
        let weight = 2.0 * i as f64 - nf + 1.0;
        weighted += weight * v;
        total += v;
    }
    weighted / (nf * total)
}

/// Generalized entropy index GE(alpha) of the sample distribution.
///
/// # Errors
///
/// Returns [`VoxStackError::InvalidArgument`] if `alpha` is negative.
pub fn entropy_index<T: Sample>(samples: &mut [T], alpha: f64) -> Result<f64> {
    Ok(generalized_entropy(samples, Alpha::new(alpha)?))
}

/// Theil index, i.e. GE(1)
pub fn theil_index<T: Sample>(samples: &mut [T]) -> f64 {
    generalized_entropy(samples, Alpha::THEIL)
}

/// Generalized entropy index for an already validated exponent.
///
/// Empty and constant sample sets yield 0. Shifts the samples to be strictly
/// positive.
pub fn generalized_entropy<T: Sample>(samples: &mut [T], alpha: Alpha) -> f64 {
    let n = samples.len();
    if n == 0 || all_equal(samples) {
        return 0.0;
    }
    shift_to_positive(samples);

    #[allow(clippy::cast_precision_loss)]
    let nf = n as f64;
    let mean = samples.iter().map(|&v| as_f64(v)).sum::<f64>() / nf;

    let a = alpha.value();
    let sum = if a == 0.0 {
        samples.iter().map(|&v| -(as_f64(v) / mean).ln()).sum::<f64>()
    } else if a == 1.0 {
        samples
            .iter()
            .map(|&v| {
                let p = as_f64(v) / mean;
                p * p.ln()
            })
            .sum::<f64>()
    } else if a == 2.0 {
        let squares = samples.iter().map(|&v| as_f64(v).powi(2)).sum::<f64>();
        (squares / (mean * mean) - nf) / 2.0
    } else {
        let powers = samples
            .iter()
            .map(|&v| (as_f64(v) / mean).powf(a))
            .sum::<f64>();
        (powers - nf) / (a * (a - 1.0))
    };
    sum / nf
}
