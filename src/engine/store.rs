//! The storage engine: container tree, mode machine, and primitives.
//!
//! One [`Store`] owns everything behind a single container file: the tree
//! of containers keyed by id (root id 0), the file-scoped dimension table,
//! per-container variables with their payloads, and the global define/data
//! mode. The primitive surface mirrors the operation families of the
//! format: lifecycle, mode transitions, inquiry, definition, and typed
//! transfer in whole/sub-array/strided/scalar addressing.
//!
//! The engine buffers the container in memory; `sync` serializes the whole
//! tree back to the file. Under share access every data write is followed
//! by an immediate sync.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::element::{Atomic, ElementStore};
use super::hyperslab::Hyperslab;
use super::{reader, writer, StoreError};
use crate::util::DataType;

/// Id of the root container.
pub(crate) const ROOT_ID: i32 = 0;

/// Global per-file mode: structural changes happen in `Define`, data
/// transfer in `Data`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Define,
    Data,
}

/// A named axis. Dimension ids are file-scoped; `owner` is the container
/// the dimension was defined in.
#[derive(Clone, Debug)]
pub(crate) struct DimEntry {
    pub name: String,
    pub size: usize,
    pub unlimited: bool,
    pub owner: i32,
}

/// A variable: name, element type, ordered dimension references, payload.
#[derive(Clone, Debug)]
pub(crate) struct VarEntry {
    pub name: String,
    pub dtype: DataType,
    pub dim_ids: Vec<i32>,
    pub data: ElementStore,
}

/// One node of the container tree.
#[derive(Clone, Debug)]
pub(crate) struct Container {
    pub parent: Option<i32>,
    pub name: String,
    pub dim_ids: Vec<i32>,
    pub vars: Vec<VarEntry>,
    pub children: Vec<i32>,
}

impl Container {
    pub fn root() -> Self {
        Self {
            parent: None,
            name: String::new(),
            dim_ids: Vec::new(),
            vars: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// The open container file.
#[derive(Debug)]
pub(crate) struct Store {
    pub(crate) path: PathBuf,
    pub(crate) writable: bool,
    pub(crate) share: bool,
    pub(crate) mode: Mode,
    pub(crate) closed: bool,
    pub(crate) next_container: i32,
    pub(crate) next_dim: i32,
    pub(crate) containers: BTreeMap<i32, Container>,
    pub(crate) dims: BTreeMap<i32, DimEntry>,
}

// ============================================================================
// Lifecycle
// ============================================================================

impl Store {
    /// Create a new container file. A freshly created store starts in
    /// define mode; the empty container is written out immediately so I/O
    /// failures surface at create time.
    pub fn create(path: &Path, clobber: bool) -> Result<Self, StoreError> {
        if !clobber && path.exists() {
            return Err(StoreError::AlreadyExists(path.to_path_buf()));
        }
        let mut containers = BTreeMap::new();
        containers.insert(ROOT_ID, Container::root());
        let store = Self {
            path: path.to_path_buf(),
            writable: true,
            share: false,
            mode: Mode::Define,
            closed: false,
            next_container: ROOT_ID + 1,
            next_dim: 0,
            containers,
            dims: BTreeMap::new(),
        };
        writer::write_file(&store)?;
        debug!(path = %path.display(), "created container file");
        Ok(store)
    }

    /// Open an existing container file. An opened store starts in data
    /// mode.
    pub fn open(path: &Path, writable: bool, share: bool) -> Result<Self, StoreError> {
        let mut store = reader::read_file(path)?;
        store.writable = writable;
        store.share = share;
        store.mode = Mode::Data;
        debug!(path = %path.display(), writable, share, "opened container file");
        Ok(store)
    }

    /// Flush the container to disk. A no-op on read-only handles.
    pub fn sync(&mut self) -> Result<(), StoreError> {
        if self.writable {
            writer::write_file(self)?;
        }
        Ok(())
    }

    /// Release the store, flushing pending state. Safe to call more than
    /// once; only the first call does the work.
    pub fn close(&mut self) -> Result<(), StoreError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.writable {
            writer::write_file(self)?;
        }
        debug!(path = %self.path.display(), "closed container file");
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Implicit release during teardown must never propagate.
        if !self.closed {
            self.closed = true;
            if self.writable {
                if let Err(e) = writer::write_file(self) {
                    warn!(path = %self.path.display(), error = %e, "error closing file during teardown");
                }
            }
        }
    }
}

// ============================================================================
// Mode transitions
// ============================================================================

impl Store {
    /// Enter define mode.
    pub fn redef(&mut self) -> Result<(), StoreError> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        match self.mode {
            Mode::Define => Err(StoreError::AlreadyInDefineMode),
            Mode::Data => {
                self.mode = Mode::Define;
                Ok(())
            }
        }
    }

    /// Leave define mode, committing pending definitions to disk.
    pub fn enddef(&mut self) -> Result<(), StoreError> {
        match self.mode {
            Mode::Data => Err(StoreError::AlreadyInDataMode),
            Mode::Define => {
                self.mode = Mode::Data;
                self.sync()
            }
        }
    }

    fn require_define(&self) -> Result<(), StoreError> {
        match self.mode {
            Mode::Define => Ok(()),
            Mode::Data => Err(StoreError::NotInDefineMode),
        }
    }

    fn require_data(&self) -> Result<(), StoreError> {
        match self.mode {
            Mode::Data => Ok(()),
            Mode::Define => Err(StoreError::NotInDataMode),
        }
    }
}

// ============================================================================
// Inquiry
// ============================================================================

impl Store {
    pub(crate) fn container(&self, id: i32) -> Result<&Container, StoreError> {
        self.containers.get(&id).ok_or(StoreError::UnknownContainer(id))
    }

    fn container_mut(&mut self, id: i32) -> Result<&mut Container, StoreError> {
        self.containers.get_mut(&id).ok_or(StoreError::UnknownContainer(id))
    }

    fn var(&self, container: i32, var: i32) -> Result<&VarEntry, StoreError> {
        self.container(container)?
            .vars
            .get(var as usize)
            .ok_or(StoreError::UnknownVariable(var))
    }

    /// Dimension, variable, attribute and unlimited-dimension counts for a
    /// container. Attribute storage is out of scope, so the attribute
    /// count is always zero.
    pub fn inq(&self, container: i32) -> Result<(usize, usize, usize, usize), StoreError> {
        let c = self.container(container)?;
        let n_unlimited = self.inq_unlimdims(container)?.len();
        Ok((c.dim_ids.len(), c.vars.len(), 0, n_unlimited))
    }

    /// Ids of the dimensions defined in a container, in definition order.
    pub fn inq_dimids(&self, container: i32) -> Result<Vec<i32>, StoreError> {
        Ok(self.container(container)?.dim_ids.clone())
    }

    /// Ids of the unlimited dimensions visible from a container (its own
    /// and its ancestors').
    pub fn inq_unlimdims(&self, container: i32) -> Result<Vec<i32>, StoreError> {
        let mut out = Vec::new();
        let mut current = Some(container);
        while let Some(id) = current {
            let c = self.container(id)?;
            for &d in &c.dim_ids {
                let entry = self.dims.get(&d).ok_or(StoreError::UnknownDimension(d))?;
                if entry.unlimited {
                    out.push(d);
                }
            }
            current = c.parent;
        }
        Ok(out)
    }

    /// Ids of the variables in a container.
    pub fn inq_varids(&self, container: i32) -> Result<Vec<i32>, StoreError> {
        Ok((0..self.container(container)?.vars.len() as i32).collect())
    }

    /// Ids of the child containers of a container.
    pub fn inq_grps(&self, container: i32) -> Result<Vec<i32>, StoreError> {
        Ok(self.container(container)?.children.clone())
    }

    /// Name of a container.
    pub fn inq_grpname(&self, container: i32) -> Result<String, StoreError> {
        Ok(self.container(container)?.name.clone())
    }

    /// Name and current size of a dimension. For an unlimited dimension
    /// the size is its current extent.
    pub fn inq_dim(&self, dim: i32) -> Result<(String, usize), StoreError> {
        let entry = self.dims.get(&dim).ok_or(StoreError::UnknownDimension(dim))?;
        Ok((entry.name.clone(), entry.size))
    }

    /// Resolve a dimension name from a container, walking up through its
    /// ancestors. The nearest definition wins when names shadow. Returns
    /// the id, current size and unlimited flag.
    pub fn find_dim(
        &self,
        container: i32,
        name: &str,
    ) -> Result<Option<(i32, usize, bool)>, StoreError> {
        let mut current = Some(container);
        while let Some(id) = current {
            let c = self.container(id)?;
            for &d in &c.dim_ids {
                let entry = self.dims.get(&d).ok_or(StoreError::UnknownDimension(d))?;
                if entry.name == name {
                    return Ok(Some((d, entry.size, entry.unlimited)));
                }
            }
            current = c.parent;
        }
        Ok(None)
    }

    /// Name, type tag, dimension-id list and attribute count of a variable.
    pub fn inq_var(
        &self,
        container: i32,
        var: i32,
    ) -> Result<(String, DataType, Vec<i32>, usize), StoreError> {
        let v = self.var(container, var)?;
        Ok((v.name.clone(), v.dtype, v.dim_ids.clone(), 0))
    }

    /// Current shape of a variable (unlimited extents are live).
    pub fn var_shape(&self, container: i32, var: i32) -> Result<Vec<usize>, StoreError> {
        let dim_ids = self.var(container, var)?.dim_ids.clone();
        let mut shape = Vec::with_capacity(dim_ids.len());
        for d in dim_ids {
            let entry = self.dims.get(&d).ok_or(StoreError::UnknownDimension(d))?;
            shape.push(entry.size);
        }
        Ok(shape)
    }
}

// ============================================================================
// Definition
// ============================================================================

impl Store {
    /// Define a dimension. `None` size makes it unlimited (initial extent
    /// zero, grows as records are written).
    pub fn def_dim(
        &mut self,
        container: i32,
        name: &str,
        size: Option<usize>,
    ) -> Result<i32, StoreError> {
        self.require_define()?;
        self.container(container)?;
        let id = self.next_dim;
        self.next_dim += 1;
        self.dims.insert(
            id,
            DimEntry {
                name: name.to_string(),
                size: size.unwrap_or(0),
                unlimited: size.is_none(),
                owner: container,
            },
        );
        self.container_mut(container)?.dim_ids.push(id);
        Ok(id)
    }

    /// Define a variable over dimensions given by id, in axis order.
    pub fn def_var(
        &mut self,
        container: i32,
        name: &str,
        dtype: DataType,
        dim_ids: &[i32],
    ) -> Result<i32, StoreError> {
        self.require_define()?;
        let mut initial_len = 1usize;
        for (axis, &d) in dim_ids.iter().enumerate() {
            let entry = self.dims.get(&d).ok_or(StoreError::UnknownDimension(d))?;
            if !self.is_visible(entry.owner, container)? {
                return Err(StoreError::DimensionNotVisible(d));
            }
            if entry.unlimited && axis != 0 {
                return Err(StoreError::UnlimitedNotFirst);
            }
            initial_len *= entry.size;
        }
        let data = ElementStore::for_type(dtype, initial_len);
        let vars = &mut self.container_mut(container)?.vars;
        let id = vars.len() as i32;
        vars.push(VarEntry {
            name: name.to_string(),
            dtype,
            dim_ids: dim_ids.to_vec(),
            data,
        });
        Ok(id)
    }

    /// Define a child container.
    pub fn def_grp(&mut self, parent: i32, name: &str) -> Result<i32, StoreError> {
        self.require_define()?;
        self.container(parent)?;
        let id = self.next_container;
        self.next_container += 1;
        self.containers.insert(
            id,
            Container {
                parent: Some(parent),
                name: name.to_string(),
                dim_ids: Vec::new(),
                vars: Vec::new(),
                children: Vec::new(),
            },
        );
        self.container_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// True if `owner` is `from` or one of its ancestors.
    fn is_visible(&self, owner: i32, from: i32) -> Result<bool, StoreError> {
        let mut current = Some(from);
        while let Some(id) = current {
            if id == owner {
                return Ok(true);
            }
            current = self.container(id)?.parent;
        }
        Ok(false)
    }
}

// ============================================================================
// Typed transfer
// ============================================================================

impl Store {
    /// Write a whole array; the buffer must hold exactly size() elements
    /// in row-major order.
    pub fn put_var<T: Atomic>(
        &mut self,
        container: i32,
        var: i32,
        values: &[T],
    ) -> Result<(), StoreError> {
        let shape = self.var_shape(container, var)?;
        self.put_slab(container, var, Hyperslab::whole(&shape), values)
    }

    /// Write a rectangular sub-array.
    pub fn put_vara<T: Atomic>(
        &mut self,
        container: i32,
        var: i32,
        start: &[usize],
        count: &[usize],
        values: &[T],
    ) -> Result<(), StoreError> {
        let rank = self.var(container, var)?.dim_ids.len();
        self.put_slab(container, var, Hyperslab::new(start, count, None, rank)?, values)
    }

    /// Write a strided sub-array.
    pub fn put_vars<T: Atomic>(
        &mut self,
        container: i32,
        var: i32,
        start: &[usize],
        count: &[usize],
        stride: &[usize],
        values: &[T],
    ) -> Result<(), StoreError> {
        let rank = self.var(container, var)?.dim_ids.len();
        self.put_slab(
            container,
            var,
            Hyperslab::new(start, count, Some(stride), rank)?,
            values,
        )
    }

    /// Write the single element of a zero-rank variable.
    pub fn put_var1<T: Atomic>(
        &mut self,
        container: i32,
        var: i32,
        value: &T,
    ) -> Result<(), StoreError> {
        self.require_rank0(container, var)?;
        self.put_slab(container, var, Hyperslab::whole(&[]), std::slice::from_ref(value))
    }

    /// Read a whole array in row-major order.
    pub fn get_var<T: Atomic>(&self, container: i32, var: i32) -> Result<Vec<T>, StoreError> {
        let shape = self.var_shape(container, var)?;
        self.get_slab(container, var, Hyperslab::whole(&shape))
    }

    /// Read a rectangular sub-array.
    pub fn get_vara<T: Atomic>(
        &self,
        container: i32,
        var: i32,
        start: &[usize],
        count: &[usize],
    ) -> Result<Vec<T>, StoreError> {
        let rank = self.var(container, var)?.dim_ids.len();
        self.get_slab(container, var, Hyperslab::new(start, count, None, rank)?)
    }

    /// Read a strided sub-array.
    pub fn get_vars<T: Atomic>(
        &self,
        container: i32,
        var: i32,
        start: &[usize],
        count: &[usize],
        stride: &[usize],
    ) -> Result<Vec<T>, StoreError> {
        let rank = self.var(container, var)?.dim_ids.len();
        self.get_slab(container, var, Hyperslab::new(start, count, Some(stride), rank)?)
    }

    /// Read the single element of a zero-rank variable.
    pub fn get_var1<T: Atomic>(&self, container: i32, var: i32) -> Result<T, StoreError> {
        self.require_rank0(container, var)?;
        let entry = self.var(container, var)?;
        if entry.dtype != T::DATA_TYPE {
            return Err(StoreError::TypeMismatch {
                name: entry.name.clone(),
                declared: entry.dtype,
                provided: T::DATA_TYPE,
            });
        }
        self.require_data()?;
        Ok(T::load_from(&entry.data, 0))
    }

    fn require_rank0(&self, container: i32, var: i32) -> Result<(), StoreError> {
        let rank = self.var(container, var)?.dim_ids.len();
        if rank != 0 {
            return Err(StoreError::Range(format!(
                "scalar access on variable of rank {rank}"
            )));
        }
        Ok(())
    }

    fn check_access<T: Atomic>(&self, container: i32, var: i32) -> Result<(), StoreError> {
        let entry = self.var(container, var)?;
        if entry.dtype != T::DATA_TYPE {
            return Err(StoreError::TypeMismatch {
                name: entry.name.clone(),
                declared: entry.dtype,
                provided: T::DATA_TYPE,
            });
        }
        self.require_data()
    }

    fn put_slab<T: Atomic>(
        &mut self,
        container: i32,
        var: i32,
        slab: Hyperslab,
        values: &[T],
    ) -> Result<(), StoreError> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        self.check_access::<T>(container, var)?;

        if slab.num_elements() != values.len() {
            return Err(StoreError::Range(format!(
                "buffer holds {} elements but the selection addresses {}",
                values.len(),
                slab.num_elements()
            )));
        }

        let dim_ids = self.var(container, var)?.dim_ids.clone();
        let mut shape = self.var_shape(container, var)?;

        // Bounds check; writes may extend an unlimited first axis.
        let mut grown: Option<(i32, usize)> = None;
        for axis in 0..shape.len() {
            let need = slab.required_extent(axis);
            if need > shape[axis] {
                let dim = self.dims.get(&dim_ids[axis]).ok_or(StoreError::UnknownDimension(dim_ids[axis]))?;
                if axis == 0 && dim.unlimited {
                    shape[0] = need;
                    grown = Some((dim_ids[0], need));
                } else {
                    return Err(StoreError::Range(format!(
                        "selection requires extent {} on axis {} (dimension {} has extent {})",
                        need, axis, dim.name, shape[axis]
                    )));
                }
            }
        }
        if let Some((dim_id, extent)) = grown {
            if let Some(entry) = self.dims.get_mut(&dim_id) {
                entry.size = extent;
            }
        }

        let total: usize = shape.iter().product();
        let entry = self
            .containers
            .get_mut(&container)
            .ok_or(StoreError::UnknownContainer(container))?
            .vars
            .get_mut(var as usize)
            .ok_or(StoreError::UnknownVariable(var))?;
        if entry.data.len() < total {
            entry.data.resize(total);
        }
        for (value, offset) in values.iter().zip(slab.offsets(&shape)) {
            value.store_into(&mut entry.data, offset);
        }

        // Share access means minimal buffering: flush after every write.
        if self.share {
            writer::write_file(self)?;
        }
        Ok(())
    }

    fn get_slab<T: Atomic>(
        &self,
        container: i32,
        var: i32,
        slab: Hyperslab,
    ) -> Result<Vec<T>, StoreError> {
        self.check_access::<T>(container, var)?;
        let shape = self.var_shape(container, var)?;

        // Reads never grow: the whole selection must be inside the current
        // extents, unlimited axes included.
        for axis in 0..shape.len() {
            let need = slab.required_extent(axis);
            if need > shape[axis] {
                return Err(StoreError::Range(format!(
                    "selection requires extent {} on axis {} (extent {})",
                    need, axis, shape[axis]
                )));
            }
        }

        let entry = self.var(container, var)?;
        Ok(slab.offsets(&shape).map(|o| T::load_from(&entry.data, o)).collect())
    }
}
