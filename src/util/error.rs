//! Error types for the ndfile library.

use std::path::PathBuf;
use thiserror::Error;

use super::DataType;
use crate::engine::StoreError;

/// Main error type for ndfile operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Creating a file failed (path conflict under NoClobber, or I/O failure)
    #[error("error creating file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    /// Opening a file failed (missing file, wrong format, or I/O failure)
    #[error("error opening file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    /// The store rejected a define/data mode transition
    #[error("{context}: {source}")]
    Mode {
        context: String,
        #[source]
        source: StoreError,
    },

    /// A variable definition referenced a dimension name that is not defined
    #[error("dimension {0} is not defined")]
    UndefinedDimension(String),

    /// Lookup of a dimension, variable or group by name found nothing
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    /// A dimension, variable or group with this name already exists
    #[error("{kind} {name} is already defined")]
    DuplicateName { kind: &'static str, name: String },

    /// Read/write element type does not match the variable's declared type
    #[error("type mismatch on variable {name}: declared {declared}, provided {provided}")]
    TypeMismatch {
        name: String,
        declared: DataType,
        provided: DataType,
    },

    /// Start/count/stride addressing exceeds the variable's extent
    #[error("range error: {0}")]
    Range(String),

    /// Operation attempted after the owning file handle was closed
    #[error("file handle is closed")]
    ResourceClosed,

    /// Any other storage engine failure, wrapped with the failing operation
    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl Error {
    /// Wrap a storage engine failure with the high-level operation that
    /// triggered it, lifting range and type errors into their own variants.
    pub(crate) fn from_store(context: &str, source: StoreError) -> Self {
        match source {
            StoreError::Range(msg) => Self::Range(msg),
            StoreError::TypeMismatch { name, declared, provided } => {
                Self::TypeMismatch { name, declared, provided }
            }
            source => Self::Store {
                context: context.to_string(),
                source,
            },
        }
    }

    /// Create a not-found error.
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound { kind, name: name.into() }
    }

    /// Create a duplicate-name error.
    pub(crate) fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::DuplicateName { kind, name: name.into() }
    }
}

/// Result type alias for ndfile operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::UndefinedDimension("lat".to_string());
        assert!(e.to_string().contains("lat"));

        let e = Error::TypeMismatch {
            name: "temperature".to_string(),
            declared: DataType::Float32,
            provided: DataType::Int32,
        };
        assert!(e.to_string().contains("float32"));
        assert!(e.to_string().contains("int32"));

        let e = Error::not_found("variable", "missing");
        assert!(e.to_string().contains("variable missing"));
    }

    #[test]
    fn test_from_store_lifts_range() {
        let e = Error::from_store("writing data", StoreError::Range("start 5 beyond extent 3".into()));
        assert!(matches!(e, Error::Range(_)));

        let e = Error::from_store("writing data", StoreError::ReadOnly);
        assert!(matches!(e, Error::Store { .. }));
        assert!(e.to_string().contains("writing data"));
    }
}
