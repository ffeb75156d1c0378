//! Access-pattern hints for scanning mappings.

use crate::errors::{RecordIoError, Result};
use crate::region::{MapVariant, MappedRegion};
use crate::utils::slice_range;

/// Memory access pattern advice for the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmapAdvice {
    /// Normal access pattern (default).
    Normal,
    /// Front-to-back scan; the kernel may read ahead aggressively and drop pages behind.
    Sequential,
    /// Will need this range soon.
    WillNeed,
}

impl MappedRegion {
    /// Advise the OS about the expected access pattern for `[offset, offset+len)`.
    ///
    /// The advice is a hint. On non-Unix platforms it is accepted and ignored.
    ///
    /// # Errors
    ///
    /// Returns `RecordIoError::OutOfBounds` if the range exceeds the mapping.
    /// Returns `RecordIoError::Io` if `madvise` fails.
    pub fn advise(&self, offset: u64, len: u64, advice: MmapAdvice) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let (start, end) = slice_range(offset, len, self.len())?;
        let ptr = match &self.map {
            MapVariant::Empty => return Ok(()),
            MapVariant::Ro(m) => m.as_ptr(),
            MapVariant::Rw(m) => m.as_ptr(),
        };

        #[cfg(unix)]
        {
            use libc::{madvise, MADV_NORMAL, MADV_SEQUENTIAL, MADV_WILLNEED};

            let flag = match advice {
                MmapAdvice::Normal => MADV_NORMAL,
                MmapAdvice::Sequential => MADV_SEQUENTIAL,
                MmapAdvice::WillNeed => MADV_WILLNEED,
            };

            // madvise wants a page-aligned address; the mapping base is page-aligned.
            let page = crate::utils::page_size();
            let aligned = crate::utils::align_down(start as u64, page as u64) as usize;
            // SAFETY: [aligned, end) lies inside the live mapping starting at `ptr`.
            let rc = unsafe {
                madvise(
                    ptr.add(aligned) as *mut libc::c_void,
                    end - aligned,
                    flag,
                )
            };
            if rc != 0 {
                return Err(RecordIoError::Io(std::io::Error::last_os_error()));
            }
        }

        #[cfg(not(unix))]
        {
            let _ = (ptr, start, end, advice);
        }

        Ok(())
    }

    /// Hint a front-to-back scan over the whole mapping when enabled.
    /// Failures are logged and ignored since the hint never affects results.
    pub(crate) fn advise_sequential(&self, enabled: bool) {
        if !enabled || cfg!(not(feature = "advise")) || self.is_empty() {
            return;
        }
        if let Err(e) = self.advise(0, self.len(), MmapAdvice::Sequential) {
            log::debug!("sequential advice ignored for {}: {e}", self.path().display());
        }
    }
}
