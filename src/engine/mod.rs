//! Low-level storage engine for the container format.
//!
//! The engine owns the on-disk representation and exposes the primitive
//! operations the object layer is built on: lifecycle, define/data mode
//! transitions, catalog inquiry, definition, and typed data transfer.
//!
//! ## File structure
//!
//! ```text
//! +--------------------+
//! | Magic: "NDF1"      |  4 bytes
//! +--------------------+
//! | Version            |  2 bytes (u16 LE)
//! +--------------------+
//! | Reserved           |  2 bytes
//! +--------------------+
//! | Root container     |  recursive: name, dimensions,
//! |                    |  variables (with payloads), children
//! +--------------------+
//! ```

mod element;
mod error;
mod format;
mod hyperslab;
mod reader;
mod store;
mod writer;

pub use element::{Atomic, ElementStore};
pub use error::StoreError;

pub(crate) use store::{Store, ROOT_ID};
