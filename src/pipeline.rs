//! End-to-end aggregation of an input stack into one output volume
//!
//! [`run`] validates the inputs, substitutes padding values, normalizes each
//! input, shifts intensities to be positive where the aggregation function
//! needs it, composites the output mask and finally evaluates the aggregation
//! function in parallel. All mutation of the inputs happens before the
//! parallel region starts.

use crate::aggregate::{aggregate_voxels, replace_unresolved, AggregationMode};
use crate::compositing::{composite_output, shift_to_positive, substitute_padding, CompositingPolicy};
use crate::errors::{Result, VoxStackError};
use crate::normalize::{normalize, NormalizationMode};
use crate::volume::Volume;
use log::{debug, info};
use std::sync::Arc;

/// Settings of one aggregation run
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationConfig {
    pub mode: AggregationMode,
    pub normalization: NormalizationMode,
    /// Raw input value marking voxels without data
    pub padding: Option<f64>,
    pub policy: CompositingPolicy,
}

impl AggregationConfig {
    pub fn new(mode: AggregationMode) -> Self {
        Self {
            mode,
            normalization: NormalizationMode::None,
            padding: None,
            policy: CompositingPolicy::Union,
        }
    }

    #[must_use]
    pub fn with_normalization(mut self, normalization: NormalizationMode) -> Self {
        self.normalization = normalization;
        self
    }

    /// Set the padding value; NaN means no padding
    #[must_use]
    pub fn with_padding(mut self, padding: Option<f64>) -> Self {
        self.padding = padding.filter(|p| !p.is_nan());
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CompositingPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self::new(AggregationMode::Mean)
    }
}

/// Stage of an aggregation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationStage {
    /// Rescaling input intensities
    Normalizing,
    /// Shifting intensities to be strictly positive
    Shifting,
    /// Computing the output foreground mask
    Compositing,
    /// Evaluating the aggregation function at each voxel
    Aggregating,
    /// Resolving remaining NaN outputs
    Finalizing,
}

/// Progress information for aggregation runs
#[derive(Debug, Clone)]
pub struct AggregationProgress {
    /// Current step (0-based).
    pub current: usize,
    /// Total number of steps.
    pub total: usize,
    pub stage: AggregationStage,
}

/// Callback type for progress reporting.
pub type ProgressCallback = Option<Arc<dyn Fn(AggregationProgress) + Send + Sync>>;

/// Report progress using the callback if set.
pub fn report_progress(
    callback: &ProgressCallback,
    current: usize,
    total: usize,
    stage: AggregationStage,
) {
    if let Some(f) = callback.as_ref() {
        f(AggregationProgress {
            current,
            total,
            stage,
        });
    }
}

/// Check that at least two inputs share one geometry.
///
/// # Errors
///
/// Returns [`VoxStackError::TooFewInputs`] or [`VoxStackError::GeometryMismatch`].
pub fn validate_inputs(volumes: &[Volume<f64>]) -> Result<()> {
    let [first, rest @ ..] = volumes else {
        return Err(VoxStackError::TooFewInputs { count: 0 });
    };
    if rest.is_empty() {
        return Err(VoxStackError::TooFewInputs { count: 1 });
    }
    for volume in rest {
        if !volume.attributes_equal(first) {
            return Err(VoxStackError::GeometryMismatch {
                path: volume.name().to_string(),
                expected: first.attributes().to_string(),
                actual: volume.attributes().to_string(),
            });
        }
    }
    Ok(())
}

/// Aggregate the input volumes voxel by voxel.
///
/// The inputs are consumed: padding substitution, normalization and the
/// positivity shift modify them in place.
///
/// # Errors
///
/// Fails with fewer than two inputs, mismatching geometries, or when no input
/// has any foreground voxel.
pub fn run(
    config: &AggregationConfig,
    mut volumes: Vec<Volume<f64>>,
    progress: &ProgressCallback,
) -> Result<Volume<f32>> {
    validate_inputs(&volumes)?;
    info!(
        "Aggregating {} images {} with {}",
        volumes.len(),
        volumes[0].attributes(),
        config.mode
    );

    substitute_padding(&mut volumes, config.padding);
    if volumes.iter().all(|v| v.count_foreground() == 0) {
        return Err(VoxStackError::NoForeground {
            padding: config.padding,
        });
    }

    if config.normalization != NormalizationMode::None {
        let total = volumes.len();
        for (i, volume) in volumes.iter_mut().enumerate() {
            report_progress(progress, i, total, AggregationStage::Normalizing);
            normalize(volume, config.normalization);
        }
        info!("Normalized images ({})", config.normalization);
    }

    if config.mode.requires_positive() {
        report_progress(progress, 0, 1, AggregationStage::Shifting);
        shift_to_positive(&mut volumes, config.padding)?;
    }

    report_progress(progress, 0, 1, AggregationStage::Compositing);
    let mut output = composite_output(
        &volumes,
        config.mode.output_background(),
        config.padding,
        config.policy,
    );
    let nvox = output.number_of_voxels();
    let nfg = output.count_foreground();
    debug!("No. of foreground voxels = {}", nfg);
    debug!("No. of background voxels = {}", nvox - nfg);

    report_progress(progress, 0, 1, AggregationStage::Aggregating);
    let evaluated = aggregate_voxels(&volumes, &mut output, config.mode);
    info!("Performed voxel-wise aggregation at {evaluated} voxels");

    report_progress(progress, 0, 1, AggregationStage::Finalizing);
    replace_unresolved(&mut output);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn volume(name: &str, shape: &[usize], values: Vec<f64>) -> Volume<f64> {
        Volume::with_shape(name, shape, values).unwrap()
    }

    #[test]
    fn test_too_few_inputs() {
        let config = AggregationConfig::default();
        let result = run(&config, vec![volume("a", &[1], vec![1.0])], &None);
        assert!(matches!(result, Err(VoxStackError::TooFewInputs { count: 1 })));
        let result = run(&config, Vec::new(), &None);
        assert!(matches!(result, Err(VoxStackError::TooFewInputs { count: 0 })));
    }

    #[test]
    fn test_geometry_mismatch() {
        let config = AggregationConfig::default();
        let volumes = vec![
            volume("a.nc", &[2, 2], vec![1.0; 4]),
            volume("b.nc", &[4], vec![1.0; 4]),
        ];
        match run(&config, volumes, &None) {
            Err(VoxStackError::GeometryMismatch { path, .. }) => assert_eq!(path, "b.nc"),
            other => panic!("Expected GeometryMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_all_padding_fails() {
        let config = AggregationConfig::new(AggregationMode::Mean).with_padding(Some(0.0));
        let volumes = vec![volume("a", &[2], vec![0.0; 2]), volume("b", &[2], vec![0.0; 2])];
        assert!(matches!(
            run(&config, volumes, &None),
            Err(VoxStackError::NoForeground { padding: Some(_) })
        ));
    }

    #[test]
    fn test_with_padding_nan_means_none() {
        let config = AggregationConfig::default().with_padding(Some(f64::NAN));
        assert_eq!(config.padding, None);
    }

    #[test]
    fn test_union_vs_intersection() {
        // bg marked by padding value -1
        let inputs = || {
            vec![
                volume("a", &[2], vec![1.0, -1.0]),
                volume("b", &[2], vec![-1.0, 2.0]),
            ]
        };
        let union = AggregationConfig::new(AggregationMode::Mean).with_padding(Some(-1.0));
        let out = run(&union, inputs(), &None).unwrap();
        assert_eq!(out.values(), &[1.0, 2.0]);

        let inter = union.clone().with_policy(CompositingPolicy::Intersection);
        let out = run(&inter, inputs(), &None).unwrap();
        // Both voxels masked; with no resolved minimum they land just below zero
        assert!(out.values().iter().all(|&v| (v + 1e-3).abs() < 1e-9));

        let inter_gini = AggregationConfig::new(AggregationMode::Gini)
            .with_padding(Some(-1.0))
            .with_policy(CompositingPolicy::Intersection);
        let out = run(&inter_gini, inputs(), &None).unwrap();
        assert!(out.is_background(0));
        assert!(out.is_background(1));
    }

    #[test]
    fn test_gini_after_global_shift() {
        let config = AggregationConfig::new(AggregationMode::Gini);
        let volumes = vec![
            volume("a", &[2], vec![-2.0, 5.0]),
            volume("b", &[2], vec![-2.0, 9.0]),
        ];
        let out = run(&config, volumes, &None).unwrap();
        assert_eq!(out.get(0), 0.0);
        assert!(out.get(1) > 0.0);
    }

    #[test]
    fn test_progress_observer_sees_stages() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&stages);
        let callback: ProgressCallback = Some(Arc::new(move |p: AggregationProgress| {
            sink.lock().unwrap().push(p.stage);
        }));
        let config = AggregationConfig::new(AggregationMode::Theil)
            .with_normalization(NormalizationMode::Mean);
        let volumes = vec![volume("a", &[2], vec![1.0, 2.0]), volume("b", &[2], vec![3.0, 4.0])];
        run(&config, volumes, &callback).unwrap();

        let seen = stages.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[
                AggregationStage::Normalizing,
                AggregationStage::Normalizing,
                AggregationStage::Shifting,
                AggregationStage::Compositing,
                AggregationStage::Aggregating,
                AggregationStage::Finalizing,
            ]
        );
    }
}
