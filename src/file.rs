//! Top-level file lifecycle.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use crate::engine::{Store, ROOT_ID};
use crate::group::Group;
use crate::handle::FileHandle;
use crate::util::{Error, Result};

/// Creation mode: whether an existing file at the path is overwritten.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreationMode {
    /// Overwrite an existing file.
    Clobber,
    /// Fail if the path already exists.
    NoClobber,
}

/// Open mode: write access and shared (minimally buffered) access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-write access.
    Write,
    /// Read-only shared access.
    Share,
    /// Read-write shared access; every data write is flushed immediately.
    WriteShare,
}

/// An open container file: the root [`Group`] plus lifecycle.
///
/// `File` dereferences to its root group, so dimensions, variables and
/// nested groups are defined and queried directly on it. The underlying
/// handle is shared with every derived group and variable; they stay
/// usable for in-memory catalog queries after [`File::close`], but any
/// operation touching the store then fails with
/// [`Error::ResourceClosed`](crate::Error::ResourceClosed).
#[derive(Debug)]
pub struct File {
    root: Group,
    path: PathBuf,
}

impl File {
    /// Create a new container file, overwriting any existing file at the
    /// path. The new file starts in define mode.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_opts(path, CreationMode::Clobber)
    }

    /// Create a new container file with an explicit creation mode.
    pub fn create_opts(path: impl AsRef<Path>, mode: CreationMode) -> Result<Self> {
        let path = path.as_ref();
        let store = Store::create(path, mode == CreationMode::Clobber).map_err(|e| {
            Error::Create {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        let handle = FileHandle::new(store);
        Ok(Self {
            root: Group::empty(handle, ROOT_ID, String::new()),
            path: path.to_path_buf(),
        })
    }

    /// Open an existing container file for writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_opts(path, OpenMode::Write)
    }

    /// Open an existing container file with an explicit open mode. The
    /// whole catalog (dimensions, variables, nested groups) is populated
    /// eagerly before the file is returned.
    pub fn open_opts(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let (writable, share) = match mode {
            OpenMode::Write => (true, false),
            OpenMode::Share => (false, true),
            OpenMode::WriteShare => (true, true),
        };
        let store = Store::open(path, writable, share).map_err(|e| Error::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        let handle = FileHandle::new(store);
        let root = Group::from_store(handle, ROOT_ID, String::new())?;
        Ok(Self {
            root,
            path: path.to_path_buf(),
        })
    }

    /// Close the file, flushing pending state. Idempotent: only the first
    /// call releases the underlying resource; later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        self.root.handle().close()
    }

    /// True until the file is explicitly closed.
    pub fn is_open(&self) -> bool {
        self.root.handle().is_open()
    }

    /// Path the file was created or opened with.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for File {
    type Target = Group;

    fn deref(&self) -> &Group {
        &self.root
    }
}

impl DerefMut for File {
    fn deref_mut(&mut self) -> &mut Group {
        &mut self.root
    }
}
