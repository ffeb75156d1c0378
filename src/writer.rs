//! Serialization of tables into a pre-sized read-write mapping.

use log::trace;

use crate::config::LineTerminator;
use crate::errors::{RecordIoError, Result};
use crate::flush::FlushPolicy;
use crate::region::MappedRegion;
use crate::tokenizer::FieldValue;
use crate::utils::{align_down, page_size};

/// Bounds-checked write cursor over a mapping.
struct Cursor<'r> {
    region: &'r mut MappedRegion,
    pos: u64,
}

impl Cursor<'_> {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.region.update_region(self.pos, bytes)?;
        self.pos += bytes.len() as u64;
        Ok(())
    }
}

/// Row layout shared by the estimator and the writer.
pub(crate) struct RowFormat<'a> {
    pub delimiter: &'a [u8],
    pub terminator: LineTerminator,
    pub flush_policy: FlushPolicy,
}

/// Write every row of `table` into `region`, which must be exactly
/// `estimate_size(table, ..)` bytes long. Returns the number of bytes written.
///
/// Rows written before a failure stay in the file.
pub(crate) fn write_rows<R, T>(
    region: &mut MappedRegion,
    table: &[R],
    format: &RowFormat<'_>,
) -> Result<u64>
where
    R: AsRef<[T]>,
    T: FieldValue,
{
    let expected = region.len();
    let page = page_size() as u64;
    let mut scratch = String::new();
    let mut rows_since_sync = 0usize;
    let mut synced_to = 0u64;
    let mut cursor = Cursor { region, pos: 0 };

    for row in table {
        for (i, field) in row.as_ref().iter().enumerate() {
            if i > 0 {
                cursor.put(format.delimiter)?;
            }
            cursor.put(field.encode(&mut scratch))?;
        }
        cursor.put(format.terminator.as_bytes())?;

        rows_since_sync += 1;
        if format.flush_policy.is_due(rows_since_sync) {
            let from = align_down(synced_to, page);
            cursor.region.flush_range(from, cursor.pos - from)?;
            trace!(
                "synced {} bytes of {} ({} rows)",
                cursor.pos - from,
                cursor.region.path().display(),
                rows_since_sync
            );
            synced_to = cursor.pos;
            rows_since_sync = 0;
        }
    }

    cursor.region.flush()?;
    if cursor.pos != expected {
        return Err(RecordIoError::SizeMismatch {
            expected,
            written: cursor.pos,
        });
    }
    Ok(cursor.pos)
}
