//! Flush policy for bulk writes.
//!
//! Controls how often a table write forces dirty pages of its mapping to disk
//! before the final flush. Only durability timing depends on the policy; the
//! bytes written never do.

/// Rows between forced syncs under the default policy. Empirical tradeoff
/// between flush overhead and peak dirty-page memory on very large tables.
pub const DEFAULT_SYNC_ROWS: usize = 800_000;

/// Policy controlling when to flush dirty pages during a bulk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Only the final flush at the end of the write.
    Never,
    /// Flush the range written so far after every N rows. `EveryRows(0)` behaves like `Never`.
    EveryRows(usize),
}

impl Default for FlushPolicy {
    fn default() -> Self {
        FlushPolicy::EveryRows(DEFAULT_SYNC_ROWS)
    }
}

impl FlushPolicy {
    /// Whether a sync is due after `rows_since_sync` rows have been written.
    #[must_use]
    pub fn is_due(self, rows_since_sync: usize) -> bool {
        match self {
            FlushPolicy::Never | FlushPolicy::EveryRows(0) => false,
            FlushPolicy::EveryRows(n) => rows_since_sync >= n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_eight_hundred_thousand_rows() {
        assert_eq!(FlushPolicy::default(), FlushPolicy::EveryRows(800_000));
        assert!(!FlushPolicy::default().is_due(799_999));
        assert!(FlushPolicy::default().is_due(800_000));
    }

    #[test]
    fn never_and_zero_never_fire() {
        assert!(!FlushPolicy::Never.is_due(usize::MAX));
        assert!(!FlushPolicy::EveryRows(0).is_due(usize::MAX));
    }
}
