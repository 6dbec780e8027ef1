use std::ops::RangeInclusive;

/// A contiguous run of item indices converted as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// Position of the batch in the final document (0-based)
    pub ordinal: usize,

    /// First item index (inclusive, 1-based)
    pub first: u64,

    /// Last item index (inclusive)
    pub last: u64,
}

impl Batch {
    pub fn indices(&self) -> RangeInclusive<u64> {
        self.first..=self.last
    }

    /// Number of items in the batch; never zero
    pub fn page_count(&self) -> u64 {
        self.last - self.first + 1
    }
}

/// Splits items `1..=count` into contiguous batches of `batch_size`
///
/// Every batch holds `batch_size` items except the last, which holds the
/// remainder. A `count` of zero yields no batches. A `batch_size` of zero is
/// treated as one.
///
/// # Example
///
/// ```
/// use page_harvest::document::plan;
///
/// let sizes: Vec<u64> = plan(57, 25).iter().map(|b| b.page_count()).collect();
/// assert_eq!(sizes, vec![25, 25, 7]);
/// ```
pub fn plan(count: u64, batch_size: usize) -> Vec<Batch> {
    let size = batch_size.max(1) as u64;
    let mut batches = Vec::new();
    let mut first = 1;

    while first <= count {
        let last = (first + size - 1).min(count);
        batches.push(Batch {
            ordinal: batches.len(),
            first,
            last,
        });
        first = last + 1;
    }

    batches
}
