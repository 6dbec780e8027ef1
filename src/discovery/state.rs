use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Shared progress of a series download
///
/// All probe workers go through one instance of this struct behind a single
/// mutex. Indices are claimed in strictly increasing order, but outcomes may
/// arrive in any order, so the count of valid items is derived from the
/// recorded successes rather than from the claim cursor.
#[derive(Debug)]
pub struct SeriesState {
    /// Next index to hand out (1-based)
    next_index: u64,

    /// Lowest index that signalled end of series, once known
    end_of_series: Option<u64>,

    /// Indices whose item is on disk
    succeeded: BTreeSet<u64>,

    /// Items fetched over the network
    downloaded: u64,

    /// Items found on disk from an earlier run
    resumed: u64,
}

impl SeriesState {
    pub fn new() -> Self {
        Self {
            next_index: 1,
            end_of_series: None,
            succeeded: BTreeSet::new(),
            downloaded: 0,
            resumed: 0,
        }
    }

    /// Claims the next index, or returns `None` once the end is known
    pub fn claim(&mut self) -> Option<u64> {
        if self.end_of_series.is_some() {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;
        Some(index)
    }

    /// Records that the item at `index` is on disk
    pub fn record_success(&mut self, index: u64, resumed: bool) {
        if self.succeeded.insert(index) {
            if resumed {
                self.resumed += 1;
            } else {
                self.downloaded += 1;
            }
        }
    }

    /// Records that `index` signalled end of series
    ///
    /// Returns true if this lowered the known boundary.
    pub fn mark_end(&mut self, index: u64) -> bool {
        match self.end_of_series {
            Some(current) if current <= index => false,
            _ => {
                self.end_of_series = Some(index);
                true
            }
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.end_of_series.is_some()
    }

    /// Number of indices handed out so far
    pub fn claimed(&self) -> u64 {
        self.next_index - 1
    }

    /// Largest `n` such that `1..=n` all succeeded and lie below the end
    pub fn contiguous_count(&self) -> u64 {
        let limit = self.end_of_series.unwrap_or(u64::MAX);
        let mut count = 0;
        for &index in &self.succeeded {
            if index != count + 1 || index >= limit {
                break;
            }
            count = index;
        }
        count
    }

    /// Successful indices that fall outside the contiguous run
    pub fn spurious(&self) -> Vec<u64> {
        let count = self.contiguous_count();
        self.succeeded
            .range(count + 1..)
            .copied()
            .collect()
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }

    pub fn resumed(&self) -> u64 {
        self.resumed
    }
}

impl Default for SeriesState {
    fn default() -> Self {
        Self::new()
    }
}

/// Locks the shared state, recovering it if a worker panicked while holding it
pub(crate) fn lock_state(state: &Mutex<SeriesState>) -> MutexGuard<'_, SeriesState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
