use crate::scanner::FieldSlice;

/// The minimal per-row payload carried through the sort: the sort key(s)
/// plus references to the raw row bytes. Never heap-per-row — both byte
/// slices alias either the mapped file or a worker arena.
#[derive(Clone, Copy)]
pub struct SortRecord<'a> {
    /// Unsigned-comparable key, already XOR-masked for direction.
    pub radix_key: u64,
    /// `f64` parse of `sort_bytes`, or the NaN sentinel on parse failure.
    pub numeric_key: f64,
    /// The raw bytes of the sort column, used by the comparison-sort
    /// fallback to break ties the radix key's 8-byte truncation can't see.
    pub sort_bytes: FieldSlice<'a>,
    /// The entire line, re-split at emission time rather than carried as a
    /// projected row, so a LIMIT-less sort over a huge file never
    /// materializes more than one array of projected fields at a time.
    pub row_bytes: FieldSlice<'a>,
}

impl<'a> SortRecord<'a> {
    pub fn is_numeric(&self) -> bool {
        !self.numeric_key.is_nan()
    }
}
