//! Delimited record engine: bulk reads, bulk writes, and in-place patches.
//!
//! Every operation opens exactly one mapping and releases it before
//! returning. Operations on the same file must be serialized by the caller.
//!
//! Line terminators are asymmetric by default. Reads accept `\n` and `\r\n`.
//! Table writes emit `\n` after each row, while `write_all_lines` emits
//! `\r\n`. Both are configurable through [`EngineConfig`].

use std::path::Path;

use log::debug;

use crate::config::{EngineConfig, LineTerminator};
use crate::errors::Result;
use crate::estimate::estimate_size;
use crate::patch::{patch_checked, patch_unchecked, PatchSet};
use crate::region::MappedRegion;
use crate::scanner::{count_newlines, LineScanner};
use crate::tokenizer::{parse_number, split_fields, FieldValue};
use crate::writer::{write_rows, RowFormat};

/// Rows of fields, in file order.
pub type Table<T> = Vec<Vec<T>>;

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Whether `path` names an existing file or directory.
#[must_use]
pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists()
}

/// Memory-mapped engine for delimiter-separated record files.
///
/// # Examples
///
/// ```no_run
/// use mmap_records::{DelimitedEngine, PatchSet};
///
/// let engine = DelimitedEngine::with_delimiter(" ")?;
/// engine.write_string_table("points.xyz", &[vec!["1.0", "2.0", "3.0"], vec!["4.0", "5.0", "6.0"]])?;
///
/// let mut patches = PatchSet::new();
/// patches.insert(1, 2, "7.0");
/// engine.patch_fields_checked("points.xyz", &patches)?;
///
/// let table = engine.read_as_number_table("points.xyz")?;
/// assert_eq!(table[1], vec![4.0, 5.0, 7.0]);
/// # Ok::<(), mmap_records::RecordIoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DelimitedEngine {
    config: EngineConfig,
}

impl DelimitedEngine {
    /// Engine using `config` for every operation.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine with the given delimiter and default settings.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::EmptyDelimiter` if `delimiter` is empty.
    pub fn with_delimiter(delimiter: impl AsRef<[u8]>) -> Result<Self> {
        EngineConfig::with_delimiter(delimiter).map(Self::new)
    }

    /// Configuration shared by all operations.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn open_for_scan<P: AsRef<Path>>(&self, path: P) -> Result<MappedRegion> {
        let region = MappedRegion::open_ro(path)?;
        region.advise_sequential(self.config.advise());
        Ok(region)
    }

    /// Number of `\n` bytes in the file.
    ///
    /// Blank lines count here but are not rows, so this can exceed the row
    /// count of [`Self::read_as_string_table`].
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Io` if the file cannot be opened or mapped.
    pub fn count_lines<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let region = self.open_for_scan(path)?;
        Ok(count_newlines(region.as_slice()))
    }

    /// Whole file as text. Invalid UTF-8 is replaced with U+FFFD.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Io` if the file cannot be opened or mapped.
    pub fn read_all_text<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let region = self.open_for_scan(path)?;
        Ok(lossy(region.as_slice()))
    }

    /// All non-empty lines, without terminators.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Io` if the file cannot be opened or mapped.
    pub fn read_all_lines<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>> {
        self.read_lines(path, 1, None)
    }

    /// Up to `max_records` non-empty lines starting at line `start_line`
    /// (1-based, counted like row indices: blank lines are not numbered).
    /// `None` reads to the end; `start_line` 0 is treated as 1.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Io` if the file cannot be opened or mapped.
    pub fn read_lines<P: AsRef<Path>>(
        &self,
        path: P,
        start_line: usize,
        max_records: Option<usize>,
    ) -> Result<Vec<String>> {
        let region = self.open_for_scan(path)?;
        let buf = region.as_slice();
        let limit = max_records.unwrap_or(usize::MAX);
        let mut lines = Vec::with_capacity(count_newlines(buf).min(limit));
        lines.extend(
            LineScanner::new(buf)
                .skip(start_line.saturating_sub(1))
                .take(limit)
                .map(|line| lossy(line.text)),
        );
        Ok(lines)
    }

    fn read_table<P, T, F>(&self, path: P, mut convert: F) -> Result<Table<T>>
    where
        P: AsRef<Path>,
        F: FnMut(&[u8]) -> T,
    {
        let region = self.open_for_scan(path)?;
        let buf = region.as_slice();
        let delimiter = self.config.delimiter();
        let mut table = Vec::with_capacity(count_newlines(buf));
        for line in LineScanner::new(buf) {
            table.push(split_fields(line.text, delimiter).map(&mut convert).collect());
        }
        debug!(
            "read {} rows from {} ({} bytes)",
            table.len(),
            region.path().display(),
            region.len()
        );
        Ok(table)
    }

    /// Every non-empty line split into text fields.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Io` if the file cannot be opened or mapped.
    pub fn read_as_string_table<P: AsRef<Path>>(&self, path: P) -> Result<Table<String>> {
        self.read_table(path, lossy)
    }

    /// Every non-empty line split into numbers. Unparsable fields become `0.0`.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Io` if the file cannot be opened or mapped.
    pub fn read_as_number_table<P: AsRef<Path>>(&self, path: P) -> Result<Table<f64>> {
        self.read_table(path, parse_number)
    }

    /// Replace the file with exactly the bytes of `contents`.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Allocation` if the file cannot be sized.
    /// Returns `RecordIoError::Io` if it cannot be created or mapped.
    pub fn write_all_text<P: AsRef<Path>>(&self, path: P, contents: &str) -> Result<()> {
        let mut region = MappedRegion::allocate(path, contents.len() as u64)?;
        region.update_region(0, contents.as_bytes())?;
        region.flush()?;
        debug!("wrote {} bytes to {}", contents.len(), region.path().display());
        Ok(())
    }

    /// Replace the file with `lines`, each followed by the configured line
    /// terminator (`\r\n` by default).
    ///
    /// # Errors
    ///
    /// Same as [`Self::write_string_table`].
    pub fn write_all_lines<P, S>(&self, path: P, lines: &[S]) -> Result<()>
    where
        P: AsRef<Path>,
        S: FieldValue,
    {
        let rows: Vec<[&S; 1]> = lines.iter().map(|line| [line]).collect();
        self.write_with(path, &rows, self.config.line_terminator())
    }

    /// Replace the file with `table`, fields joined by the delimiter and each
    /// row followed by the row terminator (`\n` by default).
    ///
    /// The file is pre-sized with [`estimate_size`] and synced according to the
    /// configured [`crate::FlushPolicy`]. On failure the file keeps whatever was
    /// written up to that point.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Allocation` if the file cannot be sized.
    /// Returns `RecordIoError::Io` if it cannot be created or mapped.
    /// Returns `RecordIoError::OutOfBounds` or `RecordIoError::SizeMismatch`
    /// if the serialized table does not match its estimated size.
    pub fn write_string_table<P, R, S>(&self, path: P, table: &[R]) -> Result<()>
    where
        P: AsRef<Path>,
        R: AsRef<[S]>,
        S: FieldValue,
    {
        self.write_with(path, table, self.config.row_terminator())
    }

    /// Replace the file with `table`, each number rendered with six fractional digits.
    ///
    /// # Errors
    ///
    /// Same as [`Self::write_string_table`].
    pub fn write_number_table<P, R>(&self, path: P, table: &[R]) -> Result<()>
    where
        P: AsRef<Path>,
        R: AsRef<[f64]>,
    {
        self.write_with(path, table, self.config.row_terminator())
    }

    fn write_with<P, R, T>(&self, path: P, table: &[R], terminator: LineTerminator) -> Result<()>
    where
        P: AsRef<Path>,
        R: AsRef<[T]>,
        T: FieldValue,
    {
        let delimiter = self.config.delimiter();
        let size = estimate_size(table, delimiter, terminator);
        let mut region = MappedRegion::allocate(path, size)?;
        let format = RowFormat {
            delimiter,
            terminator,
            flush_policy: self.config.flush_policy(),
        };
        let written = write_rows(&mut region, table, &format)?;
        debug!(
            "wrote {} rows, {written} bytes to {}",
            table.len(),
            region.path().display()
        );
        Ok(())
    }

    /// Estimated on-disk size of `table` under this engine's configuration.
    #[must_use]
    pub fn estimate_table_size<R, T>(&self, table: &[R]) -> u64
    where
        R: AsRef<[T]>,
        T: FieldValue,
    {
        estimate_size(table, self.config.delimiter(), self.config.row_terminator())
    }

    /// Overwrite fields in place. Returns the number of fields written.
    ///
    /// Each replacement must have the same byte length as the field it
    /// replaces; this is not checked (see [`crate::patch`] for what happens
    /// otherwise). Rows and fields that do not exist are skipped. An empty
    /// patch set returns without opening the file.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Io` if the file cannot be opened or mapped.
    /// Returns `RecordIoError::OutOfBounds` if a replacement runs past the end of the file.
    pub fn patch_fields<P: AsRef<Path>>(&self, path: P, patches: &PatchSet) -> Result<usize> {
        self.patch_with(path, patches, patch_unchecked)
    }

    /// Overwrite fields in place after checking that every target exists and
    /// every replacement has the original field's byte length. Writes nothing
    /// when a check fails.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::Io` if the file cannot be opened or mapped.
    /// Returns `RecordIoError::FieldNotFound` or `RecordIoError::LengthMismatch`
    /// for the first target that fails validation.
    pub fn patch_fields_checked<P: AsRef<Path>>(&self, path: P, patches: &PatchSet) -> Result<usize> {
        self.patch_with(path, patches, patch_checked)
    }

    fn patch_with<P, F>(&self, path: P, patches: &PatchSet, apply: F) -> Result<usize>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut MappedRegion, &PatchSet, &[u8]) -> Result<usize>,
    {
        if patches.is_empty() {
            return Ok(0);
        }
        let mut region = MappedRegion::open_rw(path)?;
        region.advise_sequential(self.config.advise());
        let result = apply(&mut region, patches, self.config.delimiter());
        // Flush whatever was written, even when a later replacement failed.
        region.flush()?;
        let written = result?;
        debug!(
            "patched {written} of {} fields in {}",
            patches.len(),
            region.path().display()
        );
        Ok(written)
    }
}

#[cfg(feature = "async")]
pub mod r#async {
    //! Async wrappers (Tokio) that run engine operations on the blocking pool.
    use std::path::Path;

    use super::{DelimitedEngine, Table};
    use crate::errors::{RecordIoError, Result};
    use crate::patch::PatchSet;

    async fn run_blocking<T, F>(f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| RecordIoError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    impl DelimitedEngine {
        /// Async [`DelimitedEngine::read_as_string_table`].
        ///
        /// # Errors
        ///
        /// Same as the blocking version, plus `RecordIoError::Io` if the task panics.
        pub async fn read_as_string_table_async<P: AsRef<Path>>(&self, path: P) -> Result<Table<String>> {
            let engine = self.clone();
            let path = path.as_ref().to_path_buf();
            run_blocking(move || engine.read_as_string_table(path)).await
        }

        /// Async [`DelimitedEngine::read_as_number_table`].
        ///
        /// # Errors
        ///
        /// Same as the blocking version, plus `RecordIoError::Io` if the task panics.
        pub async fn read_as_number_table_async<P: AsRef<Path>>(&self, path: P) -> Result<Table<f64>> {
            let engine = self.clone();
            let path = path.as_ref().to_path_buf();
            run_blocking(move || engine.read_as_number_table(path)).await
        }

        /// Async [`DelimitedEngine::write_string_table`]; takes ownership of the table.
        ///
        /// # Errors
        ///
        /// Same as the blocking version, plus `RecordIoError::Io` if the task panics.
        pub async fn write_string_table_async<P: AsRef<Path>>(&self, path: P, table: Table<String>) -> Result<()> {
            let engine = self.clone();
            let path = path.as_ref().to_path_buf();
            run_blocking(move || engine.write_string_table(path, &table)).await
        }

        /// Async [`DelimitedEngine::write_number_table`]; takes ownership of the table.
        ///
        /// # Errors
        ///
        /// Same as the blocking version, plus `RecordIoError::Io` if the task panics.
        pub async fn write_number_table_async<P: AsRef<Path>>(&self, path: P, table: Table<f64>) -> Result<()> {
            let engine = self.clone();
            let path = path.as_ref().to_path_buf();
            run_blocking(move || engine.write_number_table(path, &table)).await
        }

        /// Async [`DelimitedEngine::patch_fields_checked`].
        ///
        /// # Errors
        ///
        /// Same as the blocking version, plus `RecordIoError::Io` if the task panics.
        pub async fn patch_fields_checked_async<P: AsRef<Path>>(&self, path: P, patches: PatchSet) -> Result<usize> {
            let engine = self.clone();
            let path = path.as_ref().to_path_buf();
            run_blocking(move || engine.patch_fields_checked(path, &patches)).await
        }
    }
}
