//! Container file writer.
//!
//! Serializes the whole container tree to disk: header, then the root
//! container recursively (dimensions, variables with payloads, children).

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use super::element::ElementStore;
use super::format::*;
use super::store::{Store, ROOT_ID};
use super::StoreError;

/// Buffered little-endian output stream.
struct OStream {
    writer: BufWriter<File>,
}

impl OStream {
    fn create(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), StoreError> {
        self.writer.write_all(data)?;
        Ok(())
    }

    fn write_u8(&mut self, value: u8) -> Result<(), StoreError> {
        self.writer.write_u8(value)?;
        Ok(())
    }

    fn write_u16(&mut self, value: u16) -> Result<(), StoreError> {
        self.writer.write_u16::<LittleEndian>(value)?;
        Ok(())
    }

    fn write_u32(&mut self, value: u32) -> Result<(), StoreError> {
        self.writer.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    fn write_u64(&mut self, value: u64) -> Result<(), StoreError> {
        self.writer.write_u64::<LittleEndian>(value)?;
        Ok(())
    }

    fn write_i32(&mut self, value: i32) -> Result<(), StoreError> {
        self.writer.write_i32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Length-prefixed UTF-8 string.
    fn write_str(&mut self, value: &str) -> Result<(), StoreError> {
        self.write_u32(value.len() as u32)?;
        self.write_bytes(value.as_bytes())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Write the full container tree to the store's path.
pub(crate) fn write_file(store: &Store) -> Result<(), StoreError> {
    let mut out = OStream::create(&store.path)?;
    out.write_bytes(MAGIC)?;
    out.write_u16(CURRENT_VERSION)?;
    out.write_u16(0)?; // reserved
    write_container(&mut out, store, ROOT_ID)?;
    out.flush()
}

fn write_container(out: &mut OStream, store: &Store, id: i32) -> Result<(), StoreError> {
    let container = store.container(id)?;
    out.write_str(&container.name)?;

    out.write_u32(container.dim_ids.len() as u32)?;
    for &dim_id in &container.dim_ids {
        let (name, size) = store.inq_dim(dim_id)?;
        let unlimited = store
            .dims
            .get(&dim_id)
            .map(|d| d.unlimited)
            .unwrap_or(false);
        out.write_i32(dim_id)?;
        out.write_str(&name)?;
        out.write_u64(size as u64)?;
        out.write_u8(unlimited as u8)?;
    }

    out.write_u32(container.vars.len() as u32)?;
    for var in &container.vars {
        out.write_str(&var.name)?;
        out.write_u8(var.dtype as u8)?;
        out.write_u32(var.dim_ids.len() as u32)?;
        for &dim_id in &var.dim_ids {
            out.write_i32(dim_id)?;
        }
        match &var.data {
            ElementStore::Fixed { bytes, .. } => {
                out.write_u8(PAYLOAD_FIXED)?;
                out.write_u64(bytes.len() as u64)?;
                out.write_bytes(bytes)?;
            }
            ElementStore::Text { values } => {
                out.write_u8(PAYLOAD_TEXT)?;
                out.write_u64(values.len() as u64)?;
                for value in values {
                    out.write_str(value)?;
                }
            }
        }
    }

    out.write_u32(container.children.len() as u32)?;
    for &child in &container.children {
        out.write_i32(child)?;
        write_container(out, store, child)?;
    }
    Ok(())
}
