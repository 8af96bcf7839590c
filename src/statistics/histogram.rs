//! Fixed-bin histograms and Shannon entropy

use crate::errors::{Result, VoxStackError};
use std::num::NonZeroUsize;

/// One-dimensional histogram with equally sized bins spanning `[min, max]`
#[derive(Debug, Clone)]
pub struct Histogram1D {
    min: f64,
    max: f64,
    bins: Vec<f64>,
}

impl Histogram1D {
    /// # Errors
    ///
    /// Returns an error if `num_bins` is zero or the range is empty or not finite.
    pub fn new(num_bins: usize, min: f64, max: f64) -> Result<Self> {
        if num_bins == 0 {
            return Err(VoxStackError::InvalidArgument(
                "histogram needs at least one bin".to_string(),
            ));
        }
        if !(min < max) || !min.is_finite() || !max.is_finite() {
            return Err(VoxStackError::InvalidArgument(format!(
                "invalid histogram range [{min}, {max}]"
            )));
        }
        Ok(Self::spanning(num_bins, min, max))
    }

    /// Histogram over a range already known to be finite and non-empty
    fn spanning(num_bins: usize, min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            bins: vec![0.0; num_bins],
        }
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    #[allow(clippy::cast_precision_loss)]
    fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bins.len() as f64
    }

    /// Bin index of `value`, `None` outside `[min, max]`
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if !(value >= self.min && value <= self.max) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = ((value - self.min) / self.bin_width()).floor() as usize;
        Some(index.min(self.bins.len() - 1))
    }

    /// Count one sample; values outside the range are ignored
    pub fn add_sample(&mut self, value: f64) {
        if let Some(i) = self.bin_index(value) {
            self.bins[i] += 1.0;
        }
    }

    pub fn total(&self) -> f64 {
        self.bins.iter().sum()
    }

    /// Smooth bin counts with a [1, 2, 1] kernel
    pub fn smooth(&mut self) {
        let n = self.bins.len();
        if n < 2 {
            return;
        }
        let b = &self.bins;
        let mut smoothed = vec![0.0; n];
        smoothed[0] = (2.0 * b[0] + b[1]) / 3.0;
        for i in 1..n - 1 {
            smoothed[i] = (b[i - 1] + 2.0 * b[i] + b[i + 1]) / 4.0;
        }
        smoothed[n - 1] = (b[n - 2] + 2.0 * b[n - 1]) / 3.0;
        self.bins = smoothed;
    }

    /// Shannon entropy in nats, 0 for an empty histogram
    pub fn entropy(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        -self
            .bins
            .iter()
            .filter(|&&count| count > 0.0)
            .map(|&count| {
                let p = count / total;
                p * p.ln()
            })
            .sum::<f64>()
    }
}

/// Shannon entropy of the samples' histogram over their own value range.
///
/// Non-finite samples are not counted. Constant and empty sample sets yield 0.
pub fn shannon_entropy(samples: &[f64], num_bins: NonZeroUsize, smooth: bool) -> f64 {
    let finite = samples.iter().copied().filter(|v| v.is_finite());
    let Some((min, max)) = finite.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    }) else {
        return 0.0;
    };
    if min >= max {
        return 0.0;
    }
    let mut hist = Histogram1D::spanning(num_bins.get(), min, max);
    for &value in samples {
        hist.add_sample(value);
    }
    if smooth {
        hist.smooth();
    }
    hist.entropy()
}
