//! Utility types used throughout the library.
//!
//! - [`DataType`] - Enum of atomic element types
//! - [`Error`] / [`Result`] - Error handling

mod data_type;
mod error;

pub use data_type::*;
pub use error::*;
