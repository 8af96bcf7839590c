//! Background/foreground compositing across the input stack
//!
//! Decides which voxels of the output are evaluated. Padding values in the
//! inputs are first turned into NaN so they stay recognizable after
//! normalization; the output mask then combines the per-input foreground
//! status under a [`CompositingPolicy`].

use crate::errors::{Result, VoxStackError};
use crate::volume::Volume;
use log::debug;
use rayon::prelude::*;
use std::fmt;

/// How per-input foreground status combines into the output mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositingPolicy {
    /// Output voxel is background only where every input is background
    #[default]
    Union,
    /// Output voxel is background wherever any input is background
    Intersection,
}

impl fmt::Display for CompositingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Union => f.write_str("union"),
            Self::Intersection => f.write_str("intersection"),
        }
    }
}

/// Replace the padding value by NaN in every input and make NaN their background.
///
/// Returns the number of voxels replaced.
pub fn substitute_padding(volumes: &mut [Volume<f64>], padding: Option<f64>) -> usize {
    let mut replaced = 0;
    for volume in volumes.iter_mut() {
        if let Some(pad) = padding.filter(|p| !p.is_nan()) {
            for value in volume.values_mut() {
                if *value == pad {
                    *value = f64::NAN;
                    replaced += 1;
                }
            }
        }
        volume.set_background_value(f64::NAN);
    }
    if replaced > 0 {
        debug!("Replaced {replaced} padding voxels by NaN");
    }
    replaced
}

/// Shift the foreground of all inputs so that the smallest value becomes 1.
///
/// Background voxels are set to 0, which becomes their background value.
/// Returns the amount subtracted from every foreground voxel.
///
/// # Errors
///
/// Returns [`VoxStackError::NoForeground`] if no input has any foreground voxel.
pub fn shift_to_positive(volumes: &mut [Volume<f64>], padding: Option<f64>) -> Result<f64> {
    let min_value = volumes
        .iter()
        .filter_map(Volume::min_max)
        .map(|(lo, _)| lo)
        .fold(f64::INFINITY, f64::min);
    if min_value.is_infinite() {
        return Err(VoxStackError::NoForeground { padding });
    }

    let shift = min_value - 1.0;
    for volume in volumes.iter_mut() {
        let mask = volume.foreground_mask();
        for (value, fg) in volume.values_mut().iter_mut().zip(mask) {
            *value = if fg { *value - shift } else { 0.0 };
        }
        volume.set_background_value(0.0);
    }
    debug!("Shifted foreground intensities by {}", -shift);
    Ok(shift)
}

/// Create the output volume and mark the voxels that are not evaluated.
///
/// Every voxel is evaluated unless a padding value is configured. Evaluated
/// voxels start at 0, the others hold `background`, which is also set as the
/// output's background value.
pub fn composite_output(
    volumes: &[Volume<f64>],
    background: f32,
    padding: Option<f64>,
    policy: CompositingPolicy,
) -> Volume<f32> {
    let attributes = volumes
        .first()
        .map(|v| v.attributes().clone())
        .unwrap_or_else(|| crate::volume::VolumeAttributes::from_shape(&[0]));
    let mut output = Volume::filled("output", attributes, 0.0_f32);

    if padding.is_some_and(|p| !p.is_nan()) {
        output
            .values_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(vox, value)| {
                let masked = match policy {
                    CompositingPolicy::Intersection => {
                        volumes.iter().any(|v| v.is_background(vox))
                    }
                    CompositingPolicy::Union => volumes.iter().all(|v| v.is_background(vox)),
                };
                if masked {
                    *value = background;
                }
            });
    }
    output.set_background_value(background);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(name: &str, values: Vec<f64>) -> Volume<f64> {
        let n = values.len();
        Volume::with_shape(name, &[n], values).unwrap()
    }

    #[test]
    fn test_substitute_padding() {
        let mut volumes = vec![volume("a", vec![0.0, 1.0]), volume("b", vec![2.0, 0.0])];
        assert_eq!(substitute_padding(&mut volumes, Some(0.0)), 2);
        assert!(volumes[0].is_background(0));
        assert!(volumes[1].is_background(1));
        assert!(volumes[0].background_value().is_nan());
    }

    #[test]
    fn test_substitute_without_padding_keeps_values() {
        let mut volumes = vec![volume("a", vec![0.0, 1.0])];
        assert_eq!(substitute_padding(&mut volumes, None), 0);
        assert_eq!(substitute_padding(&mut volumes, Some(f64::NAN)), 0);
        assert_eq!(volumes[0].values(), &[0.0, 1.0]);
    }

    #[test]
    fn test_shift_to_positive() {
        let mut volumes = vec![
            volume("a", vec![-3.0, f64::NAN, 2.0]),
            volume("b", vec![0.5, 1.0, f64::NAN]),
        ];
        let shift = shift_to_positive(&mut volumes, None).unwrap();
        assert_eq!(shift, -4.0);
        assert_eq!(volumes[0].values(), &[1.0, 0.0, 6.0]);
        assert_eq!(volumes[1].values(), &[4.5, 5.0, 0.0]);
        assert!(volumes[0].is_background(1));
        assert!(volumes[1].is_background(2));
    }

    #[test]
    fn test_shift_without_foreground_fails() {
        let mut volumes = vec![volume("a", vec![f64::NAN; 2]), volume("b", vec![f64::NAN; 2])];
        let result = shift_to_positive(&mut volumes, Some(0.0));
        assert!(matches!(
            result,
            Err(VoxStackError::NoForeground { padding: Some(_) })
        ));
    }

    #[test]
    fn test_union_and_intersection() {
        let volumes = vec![
            volume("a", vec![1.0, f64::NAN, f64::NAN]),
            volume("b", vec![f64::NAN, 2.0, f64::NAN]),
        ];
        let union = composite_output(&volumes, 1e-3, Some(0.0), CompositingPolicy::Union);
        assert!(union.is_foreground(0));
        assert!(union.is_foreground(1));
        assert!(union.is_background(2));

        let inter =
            composite_output(&volumes, f32::NAN, Some(0.0), CompositingPolicy::Intersection);
        assert!(inter.is_background(0));
        assert!(inter.is_background(1));
        assert!(inter.is_background(2));
    }

    #[test]
    fn test_no_padding_evaluates_everything() {
        let volumes = vec![volume("a", vec![f64::NAN, 1.0]), volume("b", vec![f64::NAN, 1.0])];
        let out = composite_output(&volumes, 1e-3, None, CompositingPolicy::Intersection);
        assert_eq!(out.count_foreground(), 2);
        assert_eq!(out.background_value(), 1e-3);
    }
}
