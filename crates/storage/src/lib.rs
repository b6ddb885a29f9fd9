//! Byte-range content storage.
//!
//! The hash trees address content by byte offset and never care how those
//! bytes end up on disk. This crate supplies that one seam: a small
//! [`ContentStorage`] trait plus two backends a reimplementation actually
//! needs to exercise the trees end to end — a single growable file, and an
//! in-memory backend for tests.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

/// Errors returned by a [`ContentStorage`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested range falls outside the reserved size.
    #[error("range {offset}..{end} out of bounds (reserved size {reserved})")]
    OutOfBounds {
        offset: u64,
        end: u64,
        reserved: u64,
    },

    /// Underlying I/O failure.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A byte-addressable content store backing a hash tree.
///
/// Implementations need not be safe for concurrent writers; the hash trees
/// that consume this trait are single-threaded, callback-driven (see the
/// crate-level concurrency note on `swift-static-tree`/`swift-live-tree`).
pub trait ContentStorage {
    /// Read exactly `buf.len()` bytes starting at `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Write `buf` at `offset`, growing the reserved size if necessary.
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<(), StorageError>;

    /// The number of bytes currently reserved (not necessarily all written).
    fn reserved_size(&self) -> u64;

    /// Grow or shrink the reserved size. Shrinking below the current
    /// reserved size truncates.
    fn resize_reserved(&mut self, new_size: u64) -> Result<(), StorageError>;

    /// Flush any buffered writes to the backing medium.
    fn flush(&mut self) -> Result<(), StorageError>;
}

/// A single backing file, grown on demand.
///
/// This is the common case: one swarm, one file on disk, addressed directly
/// by content offset (libswift's `Storage` default path before `MULTIFILE`
/// specs are layered on top — out of scope here, see crate docs).
pub struct SingleFileStorage {
    file: File,
    reserved_size: u64,
}

impl SingleFileStorage {
    /// Open (creating if absent) a single-file store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let reserved_size = file.metadata()?.len();
        Ok(Self {
            file,
            reserved_size,
        })
    }

    fn check_range(&self, offset: u64, len: usize) -> Result<(), StorageError> {
        let end = offset
            .checked_add(len as u64)
            .ok_or(StorageError::OutOfBounds {
                offset,
                end: u64::MAX,
                reserved: self.reserved_size,
            })?;
        if end > self.reserved_size {
            return Err(StorageError::OutOfBounds {
                offset,
                end,
                reserved: self.reserved_size,
            });
        }
        Ok(())
    }
}

impl ContentStorage for SingleFileStorage {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        self.check_range(offset, buf.len())?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<(), StorageError> {
        let end = offset + buf.len() as u64;
        if end > self.reserved_size {
            self.resize_reserved(end)?;
        }
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)?;
        Ok(())
    }

    fn reserved_size(&self) -> u64 {
        self.reserved_size
    }

    fn resize_reserved(&mut self, new_size: u64) -> Result<(), StorageError> {
        self.file.set_len(new_size)?;
        self.reserved_size = new_size;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.file.flush()?;
        Ok(())
    }
}

/// An in-memory content store, used by tests that should not touch disk.
#[derive(Default)]
pub struct MemoryStorage {
    buf: Vec<u8>,
}

impl MemoryStorage {
    /// An empty, zero-reserved store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw backing buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

impl ContentStorage for MemoryStorage {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        let offset = offset as usize;
        let end = offset + buf.len();
        if end > self.buf.len() {
            return Err(StorageError::OutOfBounds {
                offset: offset as u64,
                end: end as u64,
                reserved: self.buf.len() as u64,
            });
        }
        buf.copy_from_slice(&self.buf[offset..end]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<(), StorageError> {
        let offset = offset as usize;
        let end = offset + data.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn reserved_size(&self) -> u64 {
        self.buf.len() as u64
    }

    fn resize_reserved(&mut self, new_size: u64) -> Result<(), StorageError> {
        self.buf.resize(new_size as usize, 0);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_grows_on_write() {
        let mut s = MemoryStorage::new();
        s.write_at(10, b"hello").unwrap();
        assert_eq!(s.reserved_size(), 15);
        let mut buf = [0u8; 5];
        s.read_at(10, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn read_out_of_bounds_errors() {
        let mut s = MemoryStorage::new();
        s.resize_reserved(4).unwrap();
        let mut buf = [0u8; 8];
        assert!(matches!(
            s.read_at(0, &mut buf),
            Err(StorageError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn single_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.bin");
        let mut s = SingleFileStorage::open(&path).unwrap();
        s.write_at(0, b"swift").unwrap();
        s.flush().unwrap();
        let mut buf = [0u8; 5];
        s.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"swift");
    }
}
