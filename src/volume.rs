//! Dense scalar volumes with shared voxel geometry
//!
//! A [`Volume`] is a flat, row-major buffer of scalar values together with the
//! [`VolumeAttributes`] describing its grid and a background ("no data") value.
//! Voxels are addressed by linear index; the multi-dimensional view is only
//! needed for file I/O.

use crate::errors::{Result, VoxStackError};
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use num_traits::Float;
use std::fmt;

/// Geometric attributes shared by co-registered volumes
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeAttributes {
    /// Grid extent along each dimension, slowest varying first
    pub shape: Vec<usize>,
    /// Dimension names in the same order as `shape`
    pub dimension_names: Vec<String>,
    /// Coordinate values along each dimension, when the source provides them
    pub coordinates: Vec<Option<Vec<f64>>>,
}

impl VolumeAttributes {
    /// Create attributes with generic dimension names and no coordinates
    pub fn from_shape(shape: &[usize]) -> Self {
        let dimension_names = match shape.len() {
            3 => vec!["z".to_string(), "y".to_string(), "x".to_string()],
            n => (0..n).map(|i| format!("dim{i}")).collect(),
        };
        Self {
            shape: shape.to_vec(),
            coordinates: vec![None; shape.len()],
            dimension_names,
        }
    }

    /// Total number of voxels described by `shape`
    #[must_use]
    pub fn number_of_voxels(&self) -> usize {
        self.shape.iter().product()
    }
}

impl fmt::Display for VolumeAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self
            .dimension_names
            .iter()
            .zip(&self.shape)
            .map(|(name, len)| format!("{name}[{len}]"))
            .collect();
        write!(f, "({})", dims.join(", "))
    }
}

/// A scalar volume with a designated background value
#[derive(Debug, Clone)]
pub struct Volume<T> {
    name: String,
    attributes: VolumeAttributes,
    data: Vec<T>,
    background: T,
}

impl<T: Float> Volume<T> {
    /// Create a volume from row-major values.
    ///
    /// The background value defaults to NaN.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of values does not match the attributes' shape.
    pub fn from_vec(
        name: impl Into<String>,
        attributes: VolumeAttributes,
        data: Vec<T>,
    ) -> Result<Self> {
        if attributes.dimension_names.len() != attributes.shape.len()
            || attributes.coordinates.len() != attributes.shape.len()
        {
            return Err(VoxStackError::InvalidArgument(format!(
                "Volume attributes are inconsistent: {} dimensions, {} names, {} coordinate axes",
                attributes.shape.len(),
                attributes.dimension_names.len(),
                attributes.coordinates.len()
            )));
        }
        // Validates the element count against the shape
        let array = ArrayD::from_shape_vec(IxDyn(&attributes.shape), data)?;
        Ok(Self {
            name: name.into(),
            attributes,
            data: array.into_raw_vec(),
            background: T::nan(),
        })
    }

    /// Create a volume with generic attributes for the given shape
    ///
    /// # Errors
    ///
    /// Returns an error if the number of values does not match `shape`.
    pub fn with_shape(name: impl Into<String>, shape: &[usize], data: Vec<T>) -> Result<Self> {
        Self::from_vec(name, VolumeAttributes::from_shape(shape), data)
    }

    /// Create a volume of the given geometry with every voxel set to `value`
    pub fn filled(name: impl Into<String>, attributes: VolumeAttributes, value: T) -> Self {
        let n = attributes.number_of_voxels();
        Self {
            name: name.into(),
            attributes,
            data: vec![value; n],
            background: T::nan(),
        }
    }

    /// Label used in messages, usually the source file path
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &VolumeAttributes {
        &self.attributes
    }

    /// Whether both volumes are defined on the same voxel grid
    pub fn attributes_equal<U>(&self, other: &Volume<U>) -> bool {
        self.attributes == other.attributes
    }

    pub fn number_of_voxels(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn get(&self, index: usize) -> T {
        self.data[index]
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
    }

    pub fn values(&self) -> &[T] {
        &self.data
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Fill every voxel with `value`
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    pub fn background_value(&self) -> T {
        self.background
    }

    pub fn set_background_value(&mut self, value: T) {
        self.background = value;
    }

    /// Whether the voxel holds no data.
    ///
    /// NaN is never valid data, whatever the background value is.
    #[inline]
    pub fn is_background(&self, index: usize) -> bool {
        let value = self.data[index];
        value.is_nan() || value == self.background
    }

    #[inline]
    pub fn is_foreground(&self, index: usize) -> bool {
        !self.is_background(index)
    }

    /// Per-voxel foreground flags
    pub fn foreground_mask(&self) -> Vec<bool> {
        (0..self.data.len()).map(|i| self.is_foreground(i)).collect()
    }

    /// Number of foreground voxels
    pub fn count_foreground(&self) -> usize {
        (0..self.data.len()).filter(|&i| self.is_foreground(i)).count()
    }

    /// Minimum and maximum over foreground voxels, `None` if there are none
    pub fn min_max(&self) -> Option<(T, T)> {
        (0..self.data.len())
            .filter(|&i| self.is_foreground(i))
            .map(|i| self.data[i])
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Multi-dimensional view of the voxel values
    ///
    /// # Errors
    ///
    /// Returns an error if the stored values no longer match the shape.
    pub fn view(&self) -> Result<ArrayViewD<'_, T>> {
        Ok(ArrayViewD::from_shape(
            IxDyn(&self.attributes.shape),
            &self.data,
        )?)
    }
}
