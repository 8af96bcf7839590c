//! NetCDF volume I/O
//!
//! Input volumes are read from a single NetCDF variable; its dimensions and
//! coordinate variables define the voxel geometry. The aggregate is written
//! back as a `f32` variable on the same grid.

use crate::errors::{Result, VoxStackError};
use crate::volume::{Volume, VolumeAttributes};
use chrono::Utc;
use log::debug;
use ndarray::ArrayView1;
use netcdf::{AttributeValue, Variable};
use std::{fs, path::Path};

/// Default name of the written variable
pub const DEFAULT_OUTPUT_VARIABLE: &str = "aggregate";

/// Whether `var` is the coordinate variable of its only dimension
fn is_coordinate_variable(var: &Variable) -> bool {
    let dims = var.dimensions();
    dims.len() == 1 && dims[0].name() == var.name()
}

/// Value marking missing data in `var`, from `_FillValue` or `missing_value`
fn fill_value(var: &Variable) -> Option<f64> {
    ["_FillValue", "missing_value"].iter().find_map(|name| {
        var.attribute(name)
            .and_then(|attr| match attr.value().ok()? {
                AttributeValue::Float(v) => Some(f64::from(v)),
                AttributeValue::Double(v) => Some(v),
                AttributeValue::Short(v) => Some(f64::from(v)),
                AttributeValue::Int(v) => Some(f64::from(v)),
                _ => None,
            })
    })
}

/// Read a volume from a NetCDF file.
///
/// Reads `variable`, or the first variable that is not a coordinate variable
/// when no name is given. Fill values become NaN.
///
/// # Errors
///
/// Returns an error naming the path if the file cannot be read or holds no
/// matching variable.
pub fn load_volume(path: &Path, variable: Option<&str>) -> Result<Volume<f64>> {
    let load_err = |source| VoxStackError::Load {
        path: path.to_path_buf(),
        source,
    };
    let file = netcdf::open(path).map_err(load_err)?;

    let var = match variable {
        Some(name) => file.variable(name),
        None => file
            .variables()
            .find(|v| !v.dimensions().is_empty() && !is_coordinate_variable(v)),
    }
    .ok_or_else(|| VoxStackError::VariableNotFound {
        path: path.to_path_buf(),
        var: variable.unwrap_or("<data variable>").to_string(),
    })?;

    let dims = var.dimensions();
    let shape: Vec<usize> = dims.iter().map(|d| d.len()).collect();
    let dimension_names: Vec<String> = dims.iter().map(|d| d.name().to_string()).collect();
    let coordinates: Vec<Option<Vec<f64>>> = dimension_names
        .iter()
        .map(|name| {
            file.variable(name)
                .filter(is_coordinate_variable)
                .and_then(|cv| cv.get_values::<f64, _>(..).ok())
        })
        .collect();

    let mut data = var.get_values::<f64, _>(..).map_err(load_err)?;
    if let Some(fill) = fill_value(&var) {
        for value in data.iter_mut().filter(|v| **v == fill) {
            *value = f64::NAN;
        }
    }

    debug!(
        "Read variable '{}' with shape {:?} from {}",
        var.name(),
        shape,
        path.display()
    );

    let attributes = VolumeAttributes {
        shape,
        dimension_names,
        coordinates,
    };
    Volume::from_vec(path.display().to_string(), attributes, data)
}

/// Writer for aggregated volumes
pub struct VolumeWriter<'a> {
    output_path: &'a Path,
    variable_name: String,
    attributes: Vec<(String, String)>,
}

impl<'a> VolumeWriter<'a> {
    /// Create a new writer for the given destination
    pub fn new(output_path: &'a Path) -> Self {
        Self {
            output_path,
            variable_name: DEFAULT_OUTPUT_VARIABLE.to_string(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>) -> Self {
        self.variable_name = name.into();
        self
    }

    /// Add a string attribute to the written variable
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Write the volume, replacing any existing file
    ///
    /// # Errors
    ///
    /// Returns an error naming the destination if it cannot be written.
    pub fn write(&self, volume: &Volume<f32>) -> Result<()> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }
        let data = volume.view()?;
        self.write_netcdf(volume, data)
            .map_err(|source| VoxStackError::Write {
                path: self.output_path.to_path_buf(),
                source,
            })
    }

    fn write_netcdf(
        &self,
        volume: &Volume<f32>,
        data: ndarray::ArrayViewD<'_, f32>,
    ) -> std::result::Result<(), netcdf::Error> {
        let geometry = volume.attributes();
        let mut file = netcdf::create(self.output_path)?;

        // Define dimensions
        for (dim_name, &dim_len) in geometry.dimension_names.iter().zip(&geometry.shape) {
            file.add_dimension(dim_name, dim_len)?;
        }

        for (dim_name, coords) in geometry
            .dimension_names
            .iter()
            .zip(&geometry.coordinates)
        {
            if let Some(coords) = coords {
                let mut coord_var = file.add_variable::<f64>(dim_name, &[dim_name.as_str()])?;
                coord_var.put(ArrayView1::from(coords.as_slice()), ..)?;
            }
        }

        let dim_refs: Vec<&str> = geometry.dimension_names.iter().map(String::as_str).collect();
        let mut var = file.add_variable::<f32>(&self.variable_name, &dim_refs)?;

        let background = volume.background_value();
        if !background.is_nan() {
            var.put_attribute("_FillValue", background)?;
        }
        for (name, value) in &self.attributes {
            var.put_attribute(name, value.as_str())?;
        }

        var.put(data, ..)?;

        // Add history attribute
        file.add_attribute(
            "history",
            format!("Created by voxstack on {}", Utc::now().to_rfc3339()),
        )?;

        Ok(())
    }
}
