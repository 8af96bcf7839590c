//! Statistics evaluated over per-voxel sample arrays
//!
//! This module is organized into submodules:
//! - [`elementary`]: Mean, median, standard deviation and extrema with optional masks
//! - [`dispersion`]: Gini coefficient and generalized entropy index
//! - [`histogram`]: Fixed-bin histograms and Shannon entropy

pub mod dispersion;
pub mod elementary;
pub mod histogram;

// Re-export the main types and functions for convenience
pub use dispersion::{entropy_index, generalized_entropy, gini, theil_index, Alpha, Sample};
pub use histogram::{shannon_entropy, Histogram1D};
