//! Field splitting, permissive numeric parsing, and canonical numeric rendering.

use std::fmt::Write as _;

use memchr::{memchr, memmem};

/// Iterator over the delimiter-separated fields of one line.
///
/// Empty fields are kept, so `"a  b"` split on `" "` yields `a`, ``, `b`.
/// That keeps field `k + 1` exactly `len(k) + delimiter_len` bytes after field `k`.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    rest: Option<&'a [u8]>,
    delimiter: &'a [u8],
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest?;
        let found = match self.delimiter {
            [single] => memchr(*single, rest),
            multi => memmem::find(rest, multi),
        };
        match found {
            Some(i) => {
                self.rest = Some(&rest[i + self.delimiter.len()..]);
                Some(&rest[..i])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// Split `line` on `delimiter`. `delimiter` must be non-empty.
#[must_use]
pub fn split_fields<'a>(line: &'a [u8], delimiter: &'a [u8]) -> Fields<'a> {
    debug_assert!(!delimiter.is_empty(), "delimiter must not be empty");
    Fields {
        rest: Some(line),
        delimiter,
    }
}

/// Parse the longest decimal prefix of a field, like C `atof` without hex
/// floats: leading whitespace is skipped and anything unparsable is `0.0`.
/// `inf`, `infinity` and `nan` are accepted in any case; `0x1A` reads as `0.0`.
#[must_use]
pub fn parse_number(field: &[u8]) -> f64 {
    let start = field
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(field.len());
    let s = &field[start..];
    let len = numeric_prefix_len(s);
    if len == 0 {
        return 0.0;
    }
    std::str::from_utf8(&s[..len])
        .ok()
        .and_then(|t| t.parse().ok())
        .unwrap_or(0.0)
}

fn digits(s: &[u8], from: usize) -> usize {
    s.get(from..)
        .map_or(0, |t| t.iter().take_while(|b| b.is_ascii_digit()).count())
}

fn numeric_prefix_len(s: &[u8]) -> usize {
    let mut i = usize::from(matches!(s.first(), Some(b'+' | b'-')));
    let rest = &s[i..];
    for word in [&b"infinity"[..], b"inf", b"nan"] {
        if rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word) {
            return i + word.len();
        }
    }

    let int_digits = digits(s, i);
    i += int_digits;
    let mut frac_digits = 0;
    if s.get(i) == Some(&b'.') {
        frac_digits = digits(s, i + 1);
        if int_digits + frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0;
    }

    if matches!(s.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(s.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = digits(s, j);
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }
    i
}

/// Append the canonical text of `value`: fixed-point with six fractional
/// digits (`1.5` → `1.500000`), and `nan`, `inf`, `-inf` for non-finite values.
///
/// Both the size estimator and the writer use this, so their byte counts agree.
pub fn render_number(value: f64, out: &mut String) {
    if value.is_nan() {
        out.push_str(if value.is_sign_negative() { "-nan" } else { "nan" });
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "inf" } else { "-inf" });
    } else {
        // Writing into a String cannot fail.
        let _ = write!(out, "{value:.6}");
    }
}

/// A table cell that can be serialized into a record file.
///
/// `encode` must return the same bytes every time it is called on the same
/// value; the writer relies on it to match the pre-computed file size.
pub trait FieldValue {
    /// Bytes of this field, using `scratch` for values that need rendering.
    fn encode<'a>(&'a self, scratch: &'a mut String) -> &'a [u8];
}

impl FieldValue for str {
    fn encode<'a>(&'a self, _scratch: &'a mut String) -> &'a [u8] {
        self.as_bytes()
    }
}

impl FieldValue for String {
    fn encode<'a>(&'a self, _scratch: &'a mut String) -> &'a [u8] {
        self.as_bytes()
    }
}

impl FieldValue for f64 {
    fn encode<'a>(&'a self, scratch: &'a mut String) -> &'a [u8] {
        scratch.clear();
        render_number(*self, scratch);
        scratch.as_bytes()
    }
}

impl<T: FieldValue + ?Sized> FieldValue for &T {
    fn encode<'a>(&'a self, scratch: &'a mut String) -> &'a [u8] {
        (**self).encode(scratch)
    }
}
