//! In-place field patching of an existing record file.
//!
//! Field offsets are never stored. Each targeted line is re-tokenized while the
//! mapping is scanned, its field start offsets are rebuilt into a
//! [`FieldOffsets`] table local to that line, and the replacement bytes are
//! copied over the old field.
//!
//! Replacements are expected to have the same byte length as the fields they
//! replace. [`patch_unchecked`] does not verify that: a shorter value leaves
//! the tail of the old field in place, a longer one runs over the delimiter
//! and the next field (or the line terminator and the next line), and the
//! scan then continues over the modified bytes. [`patch_checked`] validates
//! every target first and writes nothing unless all of them fit.

use std::collections::{BTreeMap, HashMap};

use log::warn;

use crate::errors::{RecordIoError, Result};
use crate::region::MappedRegion;
use crate::scanner::next_line;
use crate::tokenizer::split_fields;

/// Replacement values keyed by zero-based row index, then zero-based field index.
///
/// # Examples
///
/// ```
/// use mmap_records::PatchSet;
///
/// let mut patches = PatchSet::new();
/// patches.insert(1, 2, "9.9");
/// patches.insert(4, 0, "abc");
/// assert_eq!(patches.len(), 2);
/// assert_eq!(patches.last_row(), Some(4));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    rows: BTreeMap<usize, BTreeMap<usize, String>>,
}

impl PatchSet {
    /// Empty patch set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the replacement for `(row, field)`, returning the previous one if any.
    pub fn insert(&mut self, row: usize, field: usize, value: impl Into<String>) -> Option<String> {
        self.rows.entry(row).or_default().insert(field, value.into())
    }

    /// Replacements for one row.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&BTreeMap<usize, String>> {
        self.rows.get(&row)
    }

    /// Rows with at least one replacement, ascending.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &BTreeMap<usize, String>)> {
        self.rows.iter().map(|(&row, cells)| (row, cells))
    }

    /// Highest row index with a replacement.
    #[must_use]
    pub fn last_row(&self) -> Option<usize> {
        self.rows.keys().next_back().copied()
    }

    /// Number of cells to replace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Whether there is nothing to replace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<BTreeMap<usize, BTreeMap<usize, String>>> for PatchSet {
    fn from(mut rows: BTreeMap<usize, BTreeMap<usize, String>>) -> Self {
        rows.retain(|_, cells| !cells.is_empty());
        Self { rows }
    }
}

impl From<HashMap<usize, HashMap<usize, String>>> for PatchSet {
    fn from(rows: HashMap<usize, HashMap<usize, String>>) -> Self {
        rows.into_iter()
            .flat_map(|(row, cells)| cells.into_iter().map(move |(field, v)| (row, field, v)))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(usize, usize, S)> for PatchSet {
    fn from_iter<I: IntoIterator<Item = (usize, usize, S)>>(iter: I) -> Self {
        let mut set = PatchSet::new();
        for (row, field, value) in iter {
            set.insert(row, field, value);
        }
        set
    }
}

/// Absolute position and length of one field in the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    /// Byte offset of the field's first byte.
    pub start: u64,
    /// Field length in bytes.
    pub len: usize,
}

/// Field start offsets of the line currently being patched, indexed by field.
///
/// Valid only for the line it was built from; [`FieldOffsets::rebuild`]
/// replaces the contents for each new line.
#[derive(Debug, Default)]
pub struct FieldOffsets {
    spans: Vec<FieldSpan>,
}

impl FieldOffsets {
    /// Recompute offsets for `line`, whose first byte sits at `line_start`.
    /// Field 0 starts at `line_start`; field `k + 1` starts `len(k) + delimiter.len()` after field `k`.
    pub fn rebuild(&mut self, line_start: u64, line: &[u8], delimiter: &[u8]) {
        self.spans.clear();
        let mut start = line_start;
        for field in split_fields(line, delimiter) {
            self.spans.push(FieldSpan {
                start,
                len: field.len(),
            });
            start += (field.len() + delimiter.len()) as u64;
        }
    }

    /// Span of field `index` on the current line.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<FieldSpan> {
        self.spans.get(index).copied()
    }

    /// Number of fields on the current line.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether no line has been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Single forward scan that writes replacements as their rows are reached.
/// Missing rows and fields are skipped with a warning. Returns the number of
/// fields written.
///
/// # Errors
///
/// Returns `RecordIoError::OutOfBounds` if a replacement would run past the end
/// of the file; earlier replacements remain written.
pub fn patch_unchecked(region: &mut MappedRegion, patches: &PatchSet, delimiter: &[u8]) -> Result<usize> {
    let Some(last_row) = patches.last_row() else {
        return Ok(0);
    };
    let mut offsets = FieldOffsets::default();
    let mut cursor = 0usize;
    let mut row = 0usize;
    let mut written = 0usize;

    while let Some(line) = next_line(region.as_slice(), cursor) {
        cursor = line.next;
        if let Some(cells) = patches.row(row) {
            offsets.rebuild(line.start as u64, &region.as_slice()[line.start..line.end], delimiter);
            for (&field, value) in cells {
                match offsets.get(field) {
                    Some(span) => {
                        region.update_region(span.start, value.as_bytes())?;
                        written += 1;
                    }
                    None => warn!(
                        "{}: row {row} has {} fields, skipping field {field}",
                        region.path().display(),
                        offsets.len()
                    ),
                }
            }
        }
        if row == last_row {
            return Ok(written);
        }
        row += 1;
    }

    let missing = patches.rows().filter(|&(r, _)| r >= row).count();
    warn!(
        "{}: file has {row} rows, skipping {missing} patched rows past the end",
        region.path().display()
    );
    Ok(written)
}

/// Validate every replacement against the file, then write them all.
/// Nothing is written if any target is missing or differs in byte length.
/// Returns the number of fields written.
///
/// # Errors
///
/// Returns `RecordIoError::FieldNotFound` if a row or field does not exist.
/// Returns `RecordIoError::LengthMismatch` if a replacement's length differs from the field's.
pub fn patch_checked(region: &mut MappedRegion, patches: &PatchSet, delimiter: &[u8]) -> Result<usize> {
    let plan = plan_writes(region.as_slice(), patches, delimiter)?;
    for (start, value) in &plan {
        region.update_region(*start, value.as_bytes())?;
    }
    Ok(plan.len())
}

fn plan_writes<'p>(buf: &[u8], patches: &'p PatchSet, delimiter: &[u8]) -> Result<Vec<(u64, &'p str)>> {
    let mut plan = Vec::with_capacity(patches.len());
    let mut offsets = FieldOffsets::default();
    let mut targets = patches.rows().peekable();
    let mut cursor = 0usize;
    let mut row = 0usize;

    while let Some(&(target_row, cells)) = targets.peek() {
        let Some(line) = next_line(buf, cursor) else {
            let field = cells.keys().next().copied().unwrap_or_default();
            return Err(RecordIoError::FieldNotFound { row: target_row, field });
        };
        cursor = line.next;
        if row == target_row {
            offsets.rebuild(line.start as u64, &buf[line.start..line.end], delimiter);
            for (&field, value) in cells {
                let span = offsets
                    .get(field)
                    .ok_or(RecordIoError::FieldNotFound { row, field })?;
                if span.len != value.len() {
                    return Err(RecordIoError::LengthMismatch {
                        row,
                        field,
                        expected: span.len,
                        actual: value.len(),
                    });
                }
                plan.push((span.start, value.as_str()));
            }
            targets.next();
        }
        row += 1;
    }
    Ok(plan)
}
