//! Scoped memory-mapped file region.
//!
//! A [`MappedRegion`] owns exactly one mapping for the duration of one engine
//! operation. Dropping it unmaps the file, so every exit path releases the
//! mapping. Zero-length files are represented without an OS mapping.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use memmap2::{Mmap, MmapMut};

use crate::errors::{RecordIoError, Result};
use crate::utils::slice_range;

/// Access mode for a mapped region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmapMode {
    /// Read-only mapping (source of a read).
    ReadOnly,
    /// Read-write mapping (destination of a write or target of a patch).
    ReadWrite,
}

pub(crate) enum MapVariant {
    Empty,
    Ro(Mmap),
    Rw(MmapMut),
}

/// Memory-mapped view of one file, read-only or read-write.
///
/// # Examples
///
/// ```no_run
/// use mmap_records::MappedRegion;
///
/// // Pre-size a file and write into it
/// let mut region = MappedRegion::allocate("data.txt", 6)?;
/// region.update_region(0, b"a b c\n")?;
/// region.flush()?;
/// drop(region);
///
/// let ro = MappedRegion::open_ro("data.txt")?;
/// assert_eq!(ro.as_slice(), b"a b c\n");
/// # Ok::<(), mmap_records::RecordIoError>(())
/// ```
pub struct MappedRegion {
    path: PathBuf,
    // Held so the descriptor outlives the mapping.
    _file: File,
    mode: MmapMode,
    pub(crate) map: MapVariant,
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("len", &self.len())
            .finish()
    }
}

impl MappedRegion {
    /// Create (or truncate) `path` to exactly `size` zero-filled bytes and map it read-write.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Io` if the file cannot be created or mapped.
    /// Returns `RecordIoError::Allocation` if the file length cannot be set.
    pub fn allocate<P: AsRef<Path>>(path: P, size: u64) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .read(true)
            .truncate(true)
            .open(path_ref)?;
        file.set_len(size)
            .map_err(|source| RecordIoError::Allocation { size, source })?;
        let map = if size == 0 {
            MapVariant::Empty
        } else {
            // SAFETY: the file was just sized and is held open for the mapping's lifetime.
            MapVariant::Rw(unsafe { MmapMut::map_mut(&file)? })
        };
        Ok(Self {
            path: path_ref.to_path_buf(),
            _file: file,
            mode: MmapMode::ReadWrite,
            map,
        })
    }

    /// Open an existing file and map it read-only.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Io` if the file does not exist or cannot be mapped.
    pub fn open_ro<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = OpenOptions::new().read(true).open(path_ref)?;
        let map = if file.metadata()?.len() == 0 {
            MapVariant::Empty
        } else {
            // SAFETY: read-only mapping; concurrent writers are excluded by contract.
            MapVariant::Ro(unsafe { Mmap::map(&file)? })
        };
        Ok(Self {
            path: path_ref.to_path_buf(),
            _file: file,
            mode: MmapMode::ReadOnly,
            map,
        })
    }

    /// Open an existing file and map it read-write.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Io` if the file does not exist or cannot be mapped.
    pub fn open_rw<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path_ref)?;
        let map = if file.metadata()?.len() == 0 {
            MapVariant::Empty
        } else {
            // SAFETY: the caller holds the only writer for this file during the operation.
            MapVariant::Rw(unsafe { MmapMut::map_mut(&file)? })
        };
        Ok(Self {
            path: path_ref.to_path_buf(),
            _file: file,
            mode: MmapMode::ReadWrite,
            map,
        })
    }

    /// Mapping mode.
    #[must_use]
    pub fn mode(&self) -> MmapMode {
        self.mode
    }

    /// Length of the mapping in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    /// Whether the mapped file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole mapping as a byte slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match &self.map {
            MapVariant::Empty => &[],
            MapVariant::Ro(m) => &m[..],
            MapVariant::Rw(m) => &m[..],
        }
    }

    /// Whole mapping as a mutable byte slice. Only available in `ReadWrite` mode.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::InvalidMode` on a read-only mapping.
    pub fn as_slice_mut(&mut self) -> Result<&mut [u8]> {
        match &mut self.map {
            MapVariant::Empty if self.mode == MmapMode::ReadWrite => Ok(&mut []),
            MapVariant::Rw(m) => Ok(&mut m[..]),
            _ => Err(RecordIoError::InvalidMode("mutable access on read-only mapping")),
        }
    }

    /// Copy `data` into the mapping at `offset`. Bounds-checked.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::InvalidMode` if not in `ReadWrite` mode.
    /// Returns `RecordIoError::OutOfBounds` if the range exceeds the mapping.
    pub fn update_region(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let total = self.len();
        let buf = self.as_slice_mut()?;
        let (start, end) = slice_range(offset, data.len() as u64, total)?;
        buf[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Flush outstanding changes to disk. No-op for read-only and empty mappings.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::FlushFailed` if the flush fails.
    pub fn flush(&self) -> Result<()> {
        match &self.map {
            MapVariant::Rw(m) => m.flush().map_err(|e| RecordIoError::FlushFailed(e.to_string())),
            _ => Ok(()),
        }
    }

    /// Flush a specific byte range to disk.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::OutOfBounds` if the range exceeds the mapping.
    /// Returns `RecordIoError::FlushFailed` if the flush fails.
    pub fn flush_range(&self, offset: u64, len: u64) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let (start, end) = slice_range(offset, len, self.len())?;
        match &self.map {
            MapVariant::Rw(m) => m
                .flush_range(start, end - start)
                .map_err(|e| RecordIoError::FlushFailed(e.to_string())),
            _ => Ok(()),
        }
    }
}
