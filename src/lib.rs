//! # mmap-records: memory-mapped delimited-text record I/O for Rust
//!
//! Reads, writes, and patches files of delimiter-separated records (one
//! record per line) through memory mappings.
//!
//! ## Features
//!
//! - **Bulk reads**: whole files into `Vec<Vec<String>>` or `Vec<Vec<f64>>`
//! - **Size-exact bulk writes**: the destination is pre-sized from an exact
//!   estimate and written through a bounds-checked cursor, with periodic
//!   syncs on very large tables
//! - **In-place patching**: overwrite individual fields of an existing file
//!   without rewriting it
//! - **Async support**: optional Tokio wrappers
//!
//! ## Quick Start
//!
//! ```no_run
//! use mmap_records::{DelimitedEngine, PatchSet};
//!
//! let engine = DelimitedEngine::with_delimiter(",")?;
//! engine.write_number_table("grid.csv", &[vec![1.0, 2.0], vec![3.0, 4.0]])?;
//!
//! // Same-length replacement for row 0, field 1 ("2.000000")
//! let mut patches = PatchSet::new();
//! patches.insert(0, 1, "9.500000");
//! engine.patch_fields_checked("grid.csv", &patches)?;
//!
//! let rows = engine.read_as_number_table("grid.csv")?;
//! assert_eq!(rows[0], vec![1.0, 9.5]);
//! # Ok::<(), mmap_records::RecordIoError>(())
//! ```
//!
//! ## Line numbering
//!
//! Rows are numbered from 0 and only non-empty lines are counted, for reads
//! and patches alike. Reads accept `\n` and `\r\n`; table writes emit `\n`.
//!
//! ## Modules
//!
//! - [`errors`]: Error types for all operations
//! - [`config`], [`flush`]: Engine configuration and sync policy
//! - [`region`]: Scoped memory-mapped file regions
//! - [`scanner`], [`tokenizer`]: Line and field boundaries
//! - [`estimate`]: Exact serialized table size
//! - [`patch`]: In-place field patching
//! - [`engine`]: The [`DelimitedEngine`] facade
//!
//! ## Feature Flags
//!
//! - `advise` (default): sequential-access hints on scans
//! - `async`: Tokio-based async wrappers

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]

pub mod advise;
pub mod config;
pub mod engine;
pub mod errors;
pub mod estimate;
pub mod flush;
pub mod patch;
pub mod region;
pub mod scanner;
pub mod tokenizer;
pub mod utils;
mod writer;

pub use config::{EngineConfig, EngineConfigBuilder, LineTerminator};
pub use engine::{file_exists, DelimitedEngine, Table};
pub use errors::{RecordIoError, Result};
pub use estimate::estimate_size;
pub use flush::FlushPolicy;
pub use patch::PatchSet;
pub use region::{MappedRegion, MmapMode};
