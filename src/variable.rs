//! Typed, multi-dimensional variables.

use std::sync::Arc;

use crate::dimension::Dimension;
use crate::engine::Atomic;
use crate::handle::FileHandle;
use crate::util::{DataType, Error, Result};

/// A named, typed array keyed to an ordered list of dimensions.
///
/// The element type is fixed at creation; every read and write must use
/// the matching Rust type or fail with [`Error::TypeMismatch`] before any
/// I/O happens. All data access forces the file into data mode first.
///
/// Variables are cheap to clone and keep the underlying file handle alive
/// independently of the [`crate::File`] they came from; once the handle is
/// explicitly closed, data access fails with [`Error::ResourceClosed`].
#[derive(Clone, Debug)]
pub struct Variable {
    handle: Arc<FileHandle>,
    container: i32,
    id: i32,
    name: String,
    dtype: DataType,
    dimensions: Vec<Dimension>,
}

impl Variable {
    pub(crate) fn new(
        handle: Arc<FileHandle>,
        container: i32,
        id: i32,
        name: &str,
        dtype: DataType,
        dimensions: Vec<Dimension>,
    ) -> Self {
        Self {
            handle,
            container,
            id,
            name: name.to_string(),
            dtype,
            dimensions,
        }
    }

    /// Rebuild a variable from the store: inquire name, type and the
    /// dimension-id list, then re-derive each dimension by id lookup.
    pub(crate) fn from_store(handle: &Arc<FileHandle>, container: i32, id: i32) -> Result<Self> {
        let (name, dtype, dim_infos) =
            handle.with("error inquiring variable", |s| {
                let (name, dtype, dim_ids, _n_attrs) = s.inq_var(container, id)?;
                let unlimited = s.inq_unlimdims(container)?;
                let mut infos = Vec::with_capacity(dim_ids.len());
                for dim_id in dim_ids {
                    let (dim_name, size) = s.inq_dim(dim_id)?;
                    infos.push((dim_id, dim_name, size, unlimited.contains(&dim_id)));
                }
                Ok((name, dtype, infos))
            })?;

        let dimensions = dim_infos
            .into_iter()
            .map(|(id, name, size, unlimited)| Dimension {
                id,
                name,
                size,
                unlimited,
            })
            .collect();

        Ok(Self {
            handle: handle.clone(),
            container,
            id,
            name,
            dtype,
            dimensions,
        })
    }

    /// Name of the variable.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared element type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.dtype
    }

    /// Ordered dimension references; the order defines the axis order.
    #[inline]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Number of axes. Zero-rank variables hold a single scalar.
    #[inline]
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Current shape, queried live so unlimited extents are up to date.
    pub fn shape(&self) -> Result<Vec<usize>> {
        self.handle.with(&format!("error inquiring shape of variable {}", self.name), |s| {
            s.var_shape(self.container, self.id)
        })
    }

    /// Total number of elements (product of the current shape).
    pub fn size(&self) -> Result<usize> {
        Ok(self.shape()?.iter().product())
    }

    fn check_type<T: Atomic>(&self) -> Result<()> {
        if T::DATA_TYPE != self.dtype {
            return Err(Error::TypeMismatch {
                name: self.name.clone(),
                declared: self.dtype,
                provided: T::DATA_TYPE,
            });
        }
        Ok(())
    }

    /// Write the whole array. The buffer must hold exactly
    /// [`size()`](Self::size) elements in row-major order.
    pub fn write<T: Atomic>(&self, values: &[T]) -> Result<()> {
        self.check_type::<T>()?;
        self.handle.ensure_data()?;
        self.handle.with(&format!("error writing variable {}", self.name), |s| {
            s.put_var(self.container, self.id, values)
        })
    }

    /// Read the whole array in row-major order.
    pub fn read<T: Atomic>(&self) -> Result<Vec<T>> {
        self.check_type::<T>()?;
        self.handle.ensure_data()?;
        self.handle.with(&format!("error reading variable {}", self.name), |s| {
            s.get_var(self.container, self.id)
        })
    }

    /// Write a rectangular sub-array: one start offset and one extent per
    /// axis. Writes may extend an unlimited first axis; any other
    /// out-of-range selection fails with [`Error::Range`].
    pub fn write_slab<T: Atomic>(
        &self,
        start: &[usize],
        count: &[usize],
        values: &[T],
    ) -> Result<()> {
        self.check_type::<T>()?;
        self.handle.ensure_data()?;
        self.handle.with(&format!("error writing variable {}", self.name), |s| {
            s.put_vara(self.container, self.id, start, count, values)
        })
    }

    /// Read back a rectangular sub-array.
    pub fn read_slab<T: Atomic>(&self, start: &[usize], count: &[usize]) -> Result<Vec<T>> {
        self.check_type::<T>()?;
        self.handle.ensure_data()?;
        self.handle.with(&format!("error reading variable {}", self.name), |s| {
            s.get_vara(self.container, self.id, start, count)
        })
    }

    /// Write a strided sub-array: start, extent and stride per axis.
    pub fn write_strided<T: Atomic>(
        &self,
        start: &[usize],
        count: &[usize],
        stride: &[usize],
        values: &[T],
    ) -> Result<()> {
        self.check_type::<T>()?;
        self.handle.ensure_data()?;
        self.handle.with(&format!("error writing variable {}", self.name), |s| {
            s.put_vars(self.container, self.id, start, count, stride, values)
        })
    }

    /// Read a strided sub-array.
    pub fn read_strided<T: Atomic>(
        &self,
        start: &[usize],
        count: &[usize],
        stride: &[usize],
    ) -> Result<Vec<T>> {
        self.check_type::<T>()?;
        self.handle.ensure_data()?;
        self.handle.with(&format!("error reading variable {}", self.name), |s| {
            s.get_vars(self.container, self.id, start, count, stride)
        })
    }

    /// Write the value of a zero-rank variable directly, without
    /// start/count addressing.
    pub fn write_scalar<T: Atomic>(&self, value: T) -> Result<()> {
        self.check_type::<T>()?;
        self.handle.ensure_data()?;
        self.handle.with(&format!("error writing variable {}", self.name), |s| {
            s.put_var1(self.container, self.id, &value)
        })
    }

    /// Read the value of a zero-rank variable.
    pub fn read_scalar<T: Atomic>(&self) -> Result<T> {
        self.check_type::<T>()?;
        self.handle.ensure_data()?;
        self.handle.with(&format!("error reading variable {}", self.name), |s| {
            s.get_var1(self.container, self.id)
        })
    }
}
