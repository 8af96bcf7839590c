//! voxstack: voxel-wise aggregation of co-registered volumes
//!
//! Given a stack of scalar volumes defined on the same voxel grid, voxstack
//! computes one output volume whose value at each voxel is a statistic of the
//! input values found there: mean, median, standard deviation, Gini
//! coefficient, Theil or generalized entropy index, or Shannon entropy.
//!
//! ## Key Features
//!
//! - **Parallel Processing**: The voxel grid is split into disjoint chunks evaluated with Rayon
//! - **Intensity Normalization**: Mean, median, z-score or unit-range rescaling per input
//! - **Background Handling**: Padding values, union or intersection foreground compositing
//! - **NetCDF Support**: Read input volumes and write the aggregate as NetCDF variables
//!
//! ## Module Organization
//!
//! - [`volume`]: Volume container and voxel geometry
//! - [`statistics`]: Elementary, dispersion and histogram statistics over sample arrays
//! - [`normalize`]: Intensity normalization
//! - [`compositing`]: Padding substitution, positivity shift and output masking
//! - [`aggregate`]: Aggregation modes and the parallel voxel aggregator
//! - [`pipeline`]: Configuration and the end-to-end [`pipeline::run`]
//! - [`netcdf_io`]: NetCDF file I/O
//! - [`parallel`]: Parallel processing configuration
//! - [`errors`]: Centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use voxstack::prelude::*;
//!
//! let volumes = vec![
//!     voxstack::netcdf_io::load_volume(Path::new("a.nc"), None).unwrap(),
//!     voxstack::netcdf_io::load_volume(Path::new("b.nc"), None).unwrap(),
//! ];
//! let config = AggregationConfig::new(AggregationMode::Gini)
//!     .with_normalization(NormalizationMode::ZScore)
//!     .with_padding(Some(0.0));
//! let output = voxstack::pipeline::run(&config, volumes, &None).unwrap();
//! VolumeWriter::new(Path::new("gini.nc")).write(&output).unwrap();
//! ```

// Core modules
pub mod aggregate;
pub mod compositing;
pub mod errors;
pub mod netcdf_io;
pub mod normalize;
pub mod parallel;
pub mod pipeline;
pub mod statistics;
pub mod volume;

// Direct re-exports for the public API
pub use aggregate::*;
pub use compositing::*;
pub use errors::*;
pub use netcdf_io::*;
pub use normalize::*;
pub use parallel::*;
pub use pipeline::*;
pub use volume::*;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::aggregate::AggregationMode;
    pub use crate::compositing::CompositingPolicy;
    pub use crate::errors::{Result, VoxStackError};
    pub use crate::netcdf_io::{load_volume, VolumeWriter};
    pub use crate::normalize::NormalizationMode;
    pub use crate::parallel::ParallelConfig;
    pub use crate::pipeline::{AggregationConfig, AggregationProgress, AggregationStage, ProgressCallback};
    pub use crate::volume::{Volume, VolumeAttributes};
}
