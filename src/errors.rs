//! Centralized error handling for voxstack
//!
//! Configuration problems, I/O failures and array shape errors all surface as
//! [`VoxStackError`]. Numerical degeneracies (zero variance, empty samples) are
//! not errors; they are resolved by the fallback rules of the statistics and
//! normalization modules.

use std::fmt;
use std::path::PathBuf;

/// Main error type for voxstack operations
#[derive(Debug)]
pub enum VoxStackError {
    /// NetCDF library errors not tied to a specific file
    NetCDFError(netcdf::Error),

    /// Failed to read an input volume
    Load { path: PathBuf, source: netcdf::Error },

    /// Failed to write the output volume
    Write { path: PathBuf, source: netcdf::Error },

    /// I/O operation errors
    IoError(std::io::Error),

    /// Requested variable is missing (or the file holds no data variable)
    VariableNotFound { path: PathBuf, var: String },

    /// Fewer than two input volumes were given
    TooFewInputs { count: usize },

    /// An input volume does not share the geometry of the first input
    GeometryMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Unparsable mode string
    InvalidMode { kind: &'static str, value: String },

    /// Invalid numeric argument, e.g. negative alpha or zero bins
    InvalidArgument(String),

    /// Every voxel of every input is background
    NoForeground { padding: Option<f64> },

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),
}

impl fmt::Display for VoxStackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoxStackError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            VoxStackError::Load { path, source } => {
                write!(f, "Failed to read image '{}': {}", path.display(), source)
            }
            VoxStackError::Write { path, source } => {
                write!(f, "Failed to write image '{}': {}", path.display(), source)
            }
            VoxStackError::IoError(e) => write!(f, "I/O error: {}", e),
            VoxStackError::VariableNotFound { path, var } => {
                write!(f, "Variable '{}' not found in '{}'", var, path.display())
            }
            VoxStackError::TooFewInputs { count } => {
                write!(f, "At least two input images required, got {}", count)
            }
            VoxStackError::GeometryMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "Input image {} has different attributes than previous input images: expected {}, got {}",
                path, expected, actual
            ),
            VoxStackError::InvalidMode { kind, value } => {
                write!(f, "Invalid {} mode: {}", kind, value)
            }
            VoxStackError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            VoxStackError::NoForeground { padding } => match padding {
                Some(p) => write!(
                    f,
                    "Neither input image seems to have any foreground given padding value of {}",
                    p
                ),
                None => write!(f, "Neither input image seems to have any foreground"),
            },
            VoxStackError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            VoxStackError::ArrayError(e) => write!(f, "Array error: {}", e),
        }
    }
}

impl std::error::Error for VoxStackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VoxStackError::NetCDFError(e) => Some(e),
            VoxStackError::Load { source, .. } | VoxStackError::Write { source, .. } => {
                Some(source)
            }
            VoxStackError::IoError(e) => Some(e),
            VoxStackError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for VoxStackError {
    fn from(error: netcdf::Error) -> Self {
        VoxStackError::NetCDFError(error)
    }
}

impl From<std::io::Error> for VoxStackError {
    fn from(error: std::io::Error) -> Self {
        VoxStackError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for VoxStackError {
    fn from(error: ndarray::ShapeError) -> Self {
        VoxStackError::ArrayError(error)
    }
}

/// Result type alias for voxstack operations
pub type Result<T> = std::result::Result<T, VoxStackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_inputs_message() {
        let err = VoxStackError::TooFewInputs { count: 1 };
        assert_eq!(err.to_string(), "At least two input images required, got 1");
    }

    #[test]
    fn test_no_foreground_names_padding() {
        let err = VoxStackError::NoForeground { padding: Some(-1.0) };
        assert!(err.to_string().contains("padding value of -1"));
    }

    #[test]
    fn test_geometry_mismatch_names_path() {
        let err = VoxStackError::GeometryMismatch {
            path: "b.nc".to_string(),
            expected: "[2, 2, 2]".to_string(),
            actual: "[2, 2, 3]".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("b.nc"));
        assert!(msg.contains("[2, 2, 3]"));
    }

    #[test]
    fn test_invalid_mode_message() {
        let err = VoxStackError::InvalidMode {
            kind: "aggregation",
            value: "foo".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid aggregation mode: foo");
    }

    #[test]
    fn test_io_error_has_source() {
        let err = VoxStackError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("missing"));
    }
}
