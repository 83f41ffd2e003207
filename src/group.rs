//! Catalog nodes: dimensions, variables and nested groups.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dimension::Dimension;
use crate::handle::FileHandle;
use crate::util::{DataType, Error, Result};
use crate::variable::Variable;

/// A group holds dimensions, variables and nested groups scoped to one
/// container of the file, and mediates all structural changes.
///
/// Names are unique per category within a group; defining a duplicate
/// fails with [`Error::DuplicateName`]. Structural changes force define
/// mode and are committed to disk immediately; lookups are pure catalog
/// queries and never touch the store.
#[derive(Debug)]
pub struct Group {
    handle: Arc<FileHandle>,
    id: i32,
    name: String,
    dimensions: BTreeMap<String, Dimension>,
    variables: BTreeMap<String, Variable>,
    groups: BTreeMap<String, Group>,
}

impl Group {
    /// A group with nothing in it yet (create path: the catalog fills in
    /// as definitions are added).
    pub(crate) fn empty(handle: Arc<FileHandle>, id: i32, name: String) -> Self {
        Self {
            handle,
            id,
            name,
            dimensions: BTreeMap::new(),
            variables: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }

    /// Rebuild a group and everything below it from the store (open path).
    ///
    /// Dimensions are rebuilt in two passes: first every dimension id with
    /// its name and size, then the unlimited ids again. The second pass
    /// overwrites the first pass's entries so the unlimited flag and the
    /// dynamic extent are the ones recorded.
    pub(crate) fn from_store(handle: Arc<FileHandle>, id: i32, name: String) -> Result<Self> {
        let (dim_infos, unlimited_infos, var_ids, group_infos) =
            handle.with("error reading group catalog", |s| {
                let (n_dims, n_vars, _n_attrs, _n_unlimited) = s.inq(id)?;

                let mut dim_infos = Vec::with_capacity(n_dims);
                for dim_id in s.inq_dimids(id)? {
                    let (dim_name, size) = s.inq_dim(dim_id)?;
                    dim_infos.push((dim_id, dim_name, size));
                }

                let mut unlimited_infos = Vec::new();
                for dim_id in s.inq_unlimdims(id)? {
                    let (dim_name, size) = s.inq_dim(dim_id)?;
                    unlimited_infos.push((dim_id, dim_name, size));
                }

                let var_ids = s.inq_varids(id)?;
                debug_assert_eq!(var_ids.len(), n_vars);

                let mut group_infos = Vec::new();
                for group_id in s.inq_grps(id)? {
                    group_infos.push((group_id, s.inq_grpname(group_id)?));
                }
                Ok((dim_infos, unlimited_infos, var_ids, group_infos))
            })?;

        let mut dimensions = BTreeMap::new();
        for (dim_id, dim_name, size) in dim_infos {
            dimensions.insert(
                dim_name.clone(),
                Dimension {
                    id: dim_id,
                    name: dim_name,
                    size,
                    unlimited: false,
                },
            );
        }
        for (dim_id, dim_name, size) in unlimited_infos {
            // visible unlimited ids include ancestors'; only re-mark our own
            if let Some(dim) = dimensions.get_mut(&dim_name) {
                if dim.id == dim_id {
                    dim.size = size;
                    dim.unlimited = true;
                }
            }
        }

        let mut variables = BTreeMap::new();
        for var_id in var_ids {
            let var = Variable::from_store(&handle, id, var_id)?;
            variables.insert(var.name().to_string(), var);
        }

        let mut groups = BTreeMap::new();
        for (group_id, group_name) in group_infos {
            let child = Group::from_store(handle.clone(), group_id, group_name.clone())?;
            groups.insert(group_name, child);
        }

        Ok(Self {
            handle,
            id,
            name,
            dimensions,
            variables,
            groups,
        })
    }

    pub(crate) fn handle(&self) -> &Arc<FileHandle> {
        &self.handle
    }

    /// Name of the group. The root group's name is empty.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Definition
    // ========================================================================

    /// Define a fixed-size axis.
    pub fn add_dimension(&mut self, name: &str, size: usize) -> Result<Dimension> {
        self.define_dimension(name, Some(size))
    }

    /// Define an unlimited axis, growing as records are written.
    pub fn add_unlimited_dimension(&mut self, name: &str) -> Result<Dimension> {
        self.define_dimension(name, None)
    }

    fn define_dimension(&mut self, name: &str, size: Option<usize>) -> Result<Dimension> {
        if self.dimensions.contains_key(name) {
            return Err(Error::duplicate("dimension", name));
        }
        self.handle.ensure_define()?;
        let id = self
            .handle
            .with(&format!("error defining dimension {name}"), |s| {
                s.def_dim(self.id, name, size)
            })?;
        self.sync()?;
        let dim = Dimension {
            id,
            name: name.to_string(),
            size: size.unwrap_or(0),
            unlimited: size.is_none(),
        };
        self.dimensions.insert(name.to_string(), dim.clone());
        Ok(dim)
    }

    /// Define a variable over named dimensions, in the given axis order.
    /// An empty dimension list defines a zero-rank (scalar) variable.
    ///
    /// Every name must resolve against this group's dimension catalog or
    /// an ancestor's, or the definition fails with
    /// [`Error::UndefinedDimension`] and defines nothing.
    pub fn add_variable(
        &mut self,
        name: &str,
        dimensions: &[&str],
        dtype: DataType,
    ) -> Result<Variable> {
        if self.variables.contains_key(name) {
            return Err(Error::duplicate("variable", name));
        }
        self.handle.ensure_define()?;
        let mut dims = Vec::with_capacity(dimensions.len());
        for &dim_name in dimensions {
            if let Some(dim) = self.dimensions.get(dim_name) {
                dims.push(dim.clone());
                continue;
            }
            // inherited from an ancestor group
            let found = self
                .handle
                .with(&format!("error resolving dimension {dim_name}"), |s| {
                    s.find_dim(self.id, dim_name)
                })?;
            let (id, size, unlimited) = found
                .ok_or_else(|| Error::UndefinedDimension(dim_name.to_string()))?;
            dims.push(Dimension {
                id,
                name: dim_name.to_string(),
                size,
                unlimited,
            });
        }
        let dim_ids: Vec<i32> = dims.iter().map(|d| d.id).collect();
        let id = self
            .handle
            .with(&format!("error defining variable {name}"), |s| {
                s.def_var(self.id, name, dtype, &dim_ids)
            })?;
        self.sync()?;
        let var = Variable::new(self.handle.clone(), self.id, id, name, dtype, dims);
        self.variables.insert(name.to_string(), var.clone());
        Ok(var)
    }

    /// Define a nested group and return a handle to it.
    pub fn add_group(&mut self, name: &str) -> Result<&mut Group> {
        if self.groups.contains_key(name) {
            return Err(Error::duplicate("group", name));
        }
        self.handle.ensure_define()?;
        let id = self
            .handle
            .with(&format!("error defining group {name}"), |s| s.def_grp(self.id, name))?;
        self.sync()?;
        let group = Group::empty(self.handle.clone(), id, name.to_string());
        Ok(self.groups.entry(name.to_string()).or_insert(group))
    }

    /// Commit pending definitions and flush the file.
    pub fn sync(&self) -> Result<()> {
        self.handle.ensure_data()?;
        self.handle.with("error syncing file", |s| s.sync())
    }

    // ========================================================================
    // Catalog queries
    // ========================================================================

    /// Look up a dimension by name.
    pub fn get_dimension(&self, name: &str) -> Result<Dimension> {
        self.dimensions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found("dimension", name))
    }

    /// Look up a variable by name.
    pub fn get_variable(&self, name: &str) -> Result<Variable> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found("variable", name))
    }

    /// Look up a nested group by name.
    pub fn get_group(&self, name: &str) -> Result<&Group> {
        self.groups
            .get(name)
            .ok_or_else(|| Error::not_found("group", name))
    }

    /// Look up a nested group by name, mutably (needed to define inside
    /// it).
    pub fn get_group_mut(&mut self, name: &str) -> Result<&mut Group> {
        self.groups
            .get_mut(name)
            .ok_or_else(|| Error::not_found("group", name))
    }

    /// True if a dimension with this name exists in this group.
    #[inline]
    pub fn has_dimension(&self, name: &str) -> bool {
        self.dimensions.contains_key(name)
    }

    /// True if a variable with this name exists in this group.
    #[inline]
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// True if a nested group with this name exists in this group.
    #[inline]
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Names of the nested groups, sorted.
    pub fn get_group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    /// Names of the dimensions, sorted.
    pub fn dimension_names(&self) -> Vec<String> {
        self.dimensions.keys().cloned().collect()
    }

    /// Names of the variables, sorted.
    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    /// Number of dimensions in this group.
    #[inline]
    pub fn num_dimensions(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of variables in this group.
    #[inline]
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of nested groups in this group.
    #[inline]
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }
}
