//! Storage engine error type.

use std::path::PathBuf;
use thiserror::Error;

use crate::util::DataType;

/// Errors reported by the storage engine primitives.
///
/// The mode sentinels (`AlreadyInDefineMode` / `AlreadyInDataMode`) are not
/// failures from the caller's point of view: the object layer absorbs them
/// when it re-asserts a mode that is already active.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Create target already exists and clobbering was not requested
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    /// Open target does not exist or cannot be accessed
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid magic bytes at the start of the file
    #[error("invalid container file: bad magic bytes")]
    InvalidMagic,

    /// Unsupported container format version
    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u16),

    /// File is truncated or corrupted
    #[error("unexpected end of file at offset {0}")]
    UnexpectedEof(u64),

    /// Invalid data structure in file
    #[error("invalid file structure: {0}")]
    InvalidStructure(String),

    /// Define-mode transition requested while already defining
    #[error("already in define mode")]
    AlreadyInDefineMode,

    /// Data-mode transition requested while already in data mode
    #[error("already in data mode")]
    AlreadyInDataMode,

    /// A definition primitive was called outside define mode
    #[error("operation requires define mode")]
    NotInDefineMode,

    /// A transfer primitive was called outside data mode
    #[error("operation requires data mode")]
    NotInDataMode,

    /// Write attempted on a container opened read-only
    #[error("container is read-only")]
    ReadOnly,

    /// Container id does not exist
    #[error("unknown container id {0}")]
    UnknownContainer(i32),

    /// Dimension id does not exist
    #[error("unknown dimension id {0}")]
    UnknownDimension(i32),

    /// Variable id does not exist in the container
    #[error("unknown variable id {0}")]
    UnknownVariable(i32),

    /// Variable definition referenced a dimension outside its container's scope
    #[error("dimension id {0} is not visible from this container")]
    DimensionNotVisible(i32),

    /// Payloads are contiguous row-major, so only the outermost axis may grow
    #[error("an unlimited dimension may only be the first axis of a variable")]
    UnlimitedNotFirst,

    /// Start/count/stride addressing exceeds the variable's extent
    #[error("{0}")]
    Range(String),

    /// Transfer element type does not match the variable's declared type
    #[error("variable {name} holds {declared}, got {provided}")]
    TypeMismatch {
        name: String,
        declared: DataType,
        provided: DataType,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
