//! Immutable engine configuration and its builder.

use crate::errors::{RecordIoError, Result};
use crate::flush::FlushPolicy;

/// Line terminator emitted by the write paths.
///
/// The read paths accept both forms regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    /// Bare `\n`.
    Lf,
    /// `\r\n`.
    CrLf,
}

impl LineTerminator {
    /// Terminator bytes.
    #[must_use]
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineTerminator::Lf => b"\n",
            LineTerminator::CrLf => b"\r\n",
        }
    }

    /// Terminator length in bytes.
    #[must_use]
    pub fn byte_len(self) -> usize {
        self.as_bytes().len()
    }
}

/// Configuration shared by every operation of a [`crate::DelimitedEngine`].
///
/// Fixed once built; engines holding it can be cloned and used from several
/// threads against different files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    delimiter: Vec<u8>,
    flush_policy: FlushPolicy,
    row_terminator: LineTerminator,
    line_terminator: LineTerminator,
    advise: bool,
}

impl EngineConfig {
    /// Start building a configuration. Defaults: delimiter `" "`, sync every
    /// 800,000 rows, `\n` after table rows, `\r\n` after `write_all_lines` lines.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Configuration with the given delimiter and all other settings at their defaults.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::EmptyDelimiter` if `delimiter` is empty.
    pub fn with_delimiter(delimiter: impl AsRef<[u8]>) -> Result<Self> {
        Self::builder().delimiter(delimiter).build()
    }

    /// Field delimiter bytes.
    #[must_use]
    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    /// Sync cadence for bulk table writes.
    #[must_use]
    pub fn flush_policy(&self) -> FlushPolicy {
        self.flush_policy
    }

    /// Terminator written after each table row.
    #[must_use]
    pub fn row_terminator(&self) -> LineTerminator {
        self.row_terminator
    }

    /// Terminator written after each line by `write_all_lines`.
    #[must_use]
    pub fn line_terminator(&self) -> LineTerminator {
        self.line_terminator
    }

    /// Whether scans hint sequential access to the OS.
    #[must_use]
    pub fn advise(&self) -> bool {
        self.advise
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    delimiter: Vec<u8>,
    flush_policy: FlushPolicy,
    row_terminator: LineTerminator,
    line_terminator: LineTerminator,
    advise: bool,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self {
            delimiter: b" ".to_vec(),
            flush_policy: FlushPolicy::default(),
            row_terminator: LineTerminator::Lf,
            line_terminator: LineTerminator::CrLf,
            advise: true,
        }
    }
}

impl EngineConfigBuilder {
    /// Set the field delimiter.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl AsRef<[u8]>) -> Self {
        self.delimiter = delimiter.as_ref().to_vec();
        self
    }

    /// Set the sync cadence for bulk table writes.
    #[must_use]
    pub fn flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.flush_policy = policy;
        self
    }

    /// Set the terminator written after each table row.
    #[must_use]
    pub fn row_terminator(mut self, terminator: LineTerminator) -> Self {
        self.row_terminator = terminator;
        self
    }

    /// Set the terminator written after each line by `write_all_lines`.
    #[must_use]
    pub fn line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.line_terminator = terminator;
        self
    }

    /// Enable or disable sequential-access hints on scans.
    #[must_use]
    pub fn advise(mut self, advise: bool) -> Self {
        self.advise = advise;
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::EmptyDelimiter` if the delimiter is empty.
    pub fn build(self) -> Result<EngineConfig> {
        if self.delimiter.is_empty() {
            return Err(RecordIoError::EmptyDelimiter);
        }
        Ok(EngineConfig {
            delimiter: self.delimiter,
            flush_policy: self.flush_policy,
            row_terminator: self.row_terminator,
            line_terminator: self.line_terminator,
            advise: self.advise,
        })
    }
}
