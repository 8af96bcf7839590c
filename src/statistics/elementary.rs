//! Elementary distribution statistics
//!
//! Mean, median, standard deviation and extrema of a sample array, optionally
//! restricted to the entries whose mask flag is set. Empty selections give NaN
//! (or `None` for [`extrema`]).

/// Iterate over the samples selected by `mask` (all samples without a mask)
fn selected<'a>(values: &'a [f64], mask: Option<&'a [bool]>) -> impl Iterator<Item = f64> + 'a {
    values
        .iter()
        .enumerate()
        .filter(move |(i, _)| mask.map_or(true, |m| m[*i]))
        .map(|(_, &v)| v)
}

/// Arithmetic mean of the selected samples
pub fn mean(values: &[f64], mask: Option<&[bool]>) -> f64 {
    let (sum, count) = selected(values, mask).fold((0.0_f64, 0_usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        return f64::NAN;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        sum / count as f64
    }
}

/// Median of the selected samples; the mean of the two middle values for even counts
pub fn median(values: &[f64], mask: Option<&[bool]>) -> f64 {
    let mut sorted: Vec<f64> = selected(values, mask).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_unstable_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        0.5 * (sorted[mid - 1] + sorted[mid])
    }
}

/// Mean and population standard deviation of the selected samples
pub fn normal_distribution(values: &[f64], mask: Option<&[bool]>) -> (f64, f64) {
    let mu = mean(values, mask);
    if mu.is_nan() {
        return (f64::NAN, f64::NAN);
    }
    let (sum2, count) = selected(values, mask)
        .fold((0.0_f64, 0_usize), |(s, n), v| (s + (v - mu) * (v - mu), n + 1));
    #[allow(clippy::cast_precision_loss)]
    let sigma = (sum2 / count as f64).sqrt();
    (mu, sigma)
}

/// Population standard deviation of the selected samples
pub fn stddev(values: &[f64], mask: Option<&[bool]>) -> f64 {
    normal_distribution(values, mask).1
}

/// Minimum and maximum of the selected samples
pub fn extrema(values: &[f64], mask: Option<&[bool]>) -> Option<(f64, f64)> {
    selected(values, mask).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
