//! # ndfile
//!
//! Object-oriented access layer for hierarchical n-dimensional scientific
//! data files: named dimensions, typed multi-dimensional variables
//! addressed by dimension names, nested groups, all in a single container
//! file with mixed fixed-size and growable ("unlimited") axes.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (atomic data types, errors)
//! - [`engine`] - Low-level storage engine and binary container format
//! - [`file`] / [`group`] / [`variable`] / [`dimension`] - The object layer
//!
//! ## Example
//!
//! ```no_run
//! use ndfile::{DataType, File};
//!
//! # fn main() -> ndfile::Result<()> {
//! let mut file = File::create("observations.ndf")?;
//! file.add_dimension("time", 24)?;
//! file.add_dimension("station", 4)?;
//! let temperature =
//!     file.add_variable("temperature", &["time", "station"], DataType::Float64)?;
//! temperature.write(&vec![0.0f64; 24 * 4])?;
//! file.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! Structural changes (defining dimensions, variables, groups) and data
//! access are mutually exclusive per file: the library transparently moves
//! the file between define mode and data mode as needed, so callers never
//! manage the mode themselves.

pub mod engine;
pub mod util;

pub mod dimension;
pub mod file;
pub mod group;
pub mod variable;

mod handle;

// Re-export commonly used types
pub use dimension::Dimension;
pub use engine::{Atomic, StoreError};
pub use file::{CreationMode, File, OpenMode};
pub use group::Group;
pub use util::{DataType, Error, Result};
pub use variable::Variable;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dimension::Dimension;
    pub use crate::engine::Atomic;
    pub use crate::file::{CreationMode, File, OpenMode};
    pub use crate::group::Group;
    pub use crate::util::{DataType, Error, Result};
    pub use crate::variable::Variable;
}
