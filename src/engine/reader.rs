//! Container file reader.
//!
//! Parses a container file back into an in-memory [`Store`]. The file is
//! memory-mapped when possible, with a plain buffered read as fallback.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use super::element::ElementStore;
use super::format::*;
use super::store::{Container, DimEntry, Mode, Store, VarEntry, ROOT_ID};
use super::StoreError;
use crate::util::DataType;

enum Source {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Source {
    fn bytes(&self) -> &[u8] {
        match self {
            Self::Mapped(map) => map,
            Self::Owned(buf) => buf,
        }
    }
}

/// Cursor over the file contents with little-endian primitive reads.
struct SliceReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], StoreError> {
        if self.pos + len > self.buf.len() {
            return Err(StoreError::UnexpectedEof((self.pos + len) as u64));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, StoreError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, StoreError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, StoreError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, StoreError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    fn read_i32(&mut self) -> Result<i32, StoreError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_str(&mut self) -> Result<String, StoreError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

/// Read a container file into a store. The returned store carries
/// read-only defaults; the caller sets access flags and mode.
pub(crate) fn read_file(path: &Path) -> Result<Store, StoreError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::FileNotFound(path.to_path_buf())
        } else {
            StoreError::Io(e)
        }
    })?;

    let len = file.metadata()?.len();
    if len < HEADER_SIZE as u64 {
        return Err(StoreError::UnexpectedEof(len));
    }

    // Safety: mapped read-only; a concurrent writer would be a share-mode
    // arrangement the underlying platform already permits.
    let source = match unsafe { Mmap::map(&file) } {
        Ok(map) => Source::Mapped(map),
        Err(_) => Source::Owned(std::fs::read(path)?),
    };

    parse(source.bytes(), path)
}

fn parse(buf: &[u8], path: &Path) -> Result<Store, StoreError> {
    let mut reader = SliceReader::new(buf);

    if reader.take(4)? != MAGIC {
        return Err(StoreError::InvalidMagic);
    }
    let version = reader.read_u16()?;
    if version != CURRENT_VERSION {
        return Err(StoreError::UnsupportedVersion(version));
    }
    let _reserved = reader.read_u16()?;

    let mut containers = BTreeMap::new();
    let mut dims = BTreeMap::new();
    read_container(&mut reader, &mut containers, &mut dims, ROOT_ID, None)?;

    let next_container = containers.keys().max().copied().unwrap_or(ROOT_ID) + 1;
    let next_dim = dims.keys().max().copied().map(|d| d + 1).unwrap_or(0);

    Ok(Store {
        path: path.to_path_buf(),
        writable: false,
        share: false,
        mode: Mode::Data,
        closed: false,
        next_container,
        next_dim,
        containers,
        dims,
    })
}

fn read_container(
    reader: &mut SliceReader<'_>,
    containers: &mut BTreeMap<i32, Container>,
    dims: &mut BTreeMap<i32, DimEntry>,
    id: i32,
    parent: Option<i32>,
) -> Result<(), StoreError> {
    let name = reader.read_str()?;

    let n_dims = reader.read_u32()? as usize;
    let mut dim_ids = Vec::with_capacity(n_dims);
    for _ in 0..n_dims {
        let dim_id = reader.read_i32()?;
        let dim_name = reader.read_str()?;
        let size = reader.read_u64()? as usize;
        let unlimited = reader.read_u8()? != 0;
        dim_ids.push(dim_id);
        dims.insert(
            dim_id,
            DimEntry {
                name: dim_name,
                size,
                unlimited,
                owner: id,
            },
        );
    }

    let n_vars = reader.read_u32()? as usize;
    let mut vars = Vec::with_capacity(n_vars);
    for _ in 0..n_vars {
        vars.push(read_var(reader)?);
    }

    let n_children = reader.read_u32()? as usize;
    let mut children = Vec::with_capacity(n_children);
    for _ in 0..n_children {
        let child = reader.read_i32()?;
        children.push(child);
        read_container(reader, containers, dims, child, Some(id))?;
    }

    containers.insert(
        id,
        Container {
            parent,
            name,
            dim_ids,
            vars,
            children,
        },
    );
    Ok(())
}

fn read_var(reader: &mut SliceReader<'_>) -> Result<VarEntry, StoreError> {
    let name = reader.read_str()?;
    let tag = reader.read_u8()?;
    let dtype = DataType::from_u8(tag)
        .ok_or_else(|| StoreError::InvalidStructure(format!("unknown type tag {tag}")))?;

    let n_dims = reader.read_u32()? as usize;
    let mut dim_ids = Vec::with_capacity(n_dims);
    for _ in 0..n_dims {
        dim_ids.push(reader.read_i32()?);
    }

    let data = match reader.read_u8()? {
        PAYLOAD_FIXED => {
            let n_bytes = reader.read_u64()? as usize;
            let width = dtype.num_bytes();
            if width == 0 {
                return Err(StoreError::InvalidStructure(format!(
                    "fixed payload for string variable {name}"
                )));
            }
            if n_bytes % width != 0 {
                return Err(StoreError::InvalidStructure(format!(
                    "payload of {n_bytes} bytes is not a multiple of element width {width}"
                )));
            }
            ElementStore::Fixed {
                width,
                bytes: reader.take(n_bytes)?.to_vec(),
            }
        }
        PAYLOAD_TEXT => {
            if dtype != DataType::String {
                return Err(StoreError::InvalidStructure(format!(
                    "string payload for {dtype} variable {name}"
                )));
            }
            let n_values = reader.read_u64()? as usize;
            let mut values = Vec::with_capacity(n_values);
            for _ in 0..n_values {
                values.push(reader.read_str()?);
            }
            ElementStore::Text { values }
        }
        kind => {
            return Err(StoreError::InvalidStructure(format!(
                "unknown payload kind {kind}"
            )))
        }
    };

    Ok(VarEntry {
        name,
        dtype,
        dim_ids,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::Store;

    #[test]
    fn test_roundtrip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("roundtrip.ndf");

        {
            let mut store = Store::create(&path, true).unwrap();
            let x = store.def_dim(ROOT_ID, "x", Some(3)).unwrap();
            let t = store.def_dim(ROOT_ID, "t", None).unwrap();
            let v = store.def_var(ROOT_ID, "v", DataType::Float64, &[x]).unwrap();
            let child = store.def_grp(ROOT_ID, "child").unwrap();
            store.def_var(child, "labels", DataType::String, &[]).unwrap();
            store.enddef().unwrap();
            store.put_var::<f64>(ROOT_ID, v, &[1.5, 2.5, 3.5]).unwrap();
            let _ = t;
            store.close().unwrap();
        }

        let store = Store::open(&path, false, false).unwrap();
        let (n_dims, n_vars, n_attrs, n_unlimited) = store.inq(ROOT_ID).unwrap();
        assert_eq!((n_dims, n_vars, n_attrs, n_unlimited), (2, 1, 0, 1));
        assert_eq!(store.inq_dim(0).unwrap(), ("x".to_string(), 3));
        assert_eq!(store.get_var::<f64>(ROOT_ID, 0).unwrap(), vec![1.5, 2.5, 3.5]);

        let children = store.inq_grps(ROOT_ID).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(store.inq_grpname(children[0]).unwrap(), "child");
        let (name, dtype, dim_ids, _) = store.inq_var(children[0], 0).unwrap();
        assert_eq!(name, "labels");
        assert_eq!(dtype, DataType::String);
        assert!(dim_ids.is_empty());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("not_a_container.ndf");
        std::fs::write(&path, b"plain text, longer than a header").unwrap();
        assert!(matches!(read_file(&path), Err(StoreError::InvalidMagic)));
    }

    #[test]
    fn test_truncated_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("short.ndf");
        std::fs::write(&path, b"ND").unwrap();
        assert!(matches!(read_file(&path), Err(StoreError::UnexpectedEof(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.ndf");
        assert!(matches!(read_file(&path), Err(StoreError::FileNotFound(_))));
    }
}
