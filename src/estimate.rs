//! Exact serialized size of a record table.
//!
//! The bulk writer maps a file of exactly this size and indexes into it
//! directly, so an under-count makes the write fail and an over-count leaves
//! zero bytes at the end. Both are reported as errors by the writer.

use crate::config::LineTerminator;
use crate::tokenizer::FieldValue;

/// Byte length of `table` once written with `delimiter` between fields and
/// `terminator` after every row.
///
/// # Examples
///
/// ```
/// use mmap_records::{estimate_size, LineTerminator};
///
/// let table = vec![vec!["ab", "c"], vec!["d"]];
/// // "ab c\n" + "d\n"
/// assert_eq!(estimate_size(&table, b" ", LineTerminator::Lf), 7);
///
/// let numbers = vec![vec![1.0, -2.5]];
/// // "1.000000,-2.500000\n"
/// assert_eq!(estimate_size(&numbers, b",", LineTerminator::Lf), 19);
/// ```
#[must_use]
pub fn estimate_size<R, T>(table: &[R], delimiter: &[u8], terminator: LineTerminator) -> u64
where
    R: AsRef<[T]>,
    T: FieldValue,
{
    let mut scratch = String::new();
    let mut total = 0u64;
    for row in table {
        let row = row.as_ref();
        for field in row {
            total += field.encode(&mut scratch).len() as u64;
        }
        total += row.len().saturating_sub(1) as u64 * delimiter.len() as u64;
        total += terminator.byte_len() as u64;
    }
    total
}
