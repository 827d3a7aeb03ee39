//! The compressed lookup table and its query engine.
//!
//! The first level of the partition is a flat array of entries indexed directly by the leading
//! address bits. Every entry either resolves to a result, or points to a dense or sparse block
//! that is indexed by the bits of the next level.

use std::collections::HashMap;
use std::net::IpAddr;

use crate::bits::extract_bits;
use crate::partition::DepthPartition;

mod builder;
mod dense;
mod entry;
mod sparse;
#[cfg(test)]
mod test;

pub use builder::{TableBuilder, DEFAULT_K};
pub use entry::{LookupEntry, MAX_ENTRY_INDEX};

use dense::DenseStore;
pub(crate) use entry::PackedEntry;
use sparse::SparseStore;

/// Immutable multi-level lookup table answering longest-prefix-match queries. Build it with a
/// [`TableBuilder`] or [`crate::build`].
///
/// The table never changes after it is built, so it can be shared across threads without
/// locking.
///
/// ```
/// # use fib_compress::*;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let table = build(
///     [
///         ([10, 0, 0, 0], 8, "broad"),
///         ([10, 1, 0, 0], 16, "narrow"),
///         ([10, 1, 2, 0], 24, "narrower"),
///     ],
///     &[16, 8, 8],
///     DEFAULT_K,
/// )?;
/// assert_eq!(table.lookup(&[10, 1, 2, 100]), Some(&"narrower"));
/// assert_eq!(table.lookup(&[10, 1, 3, 1]), Some(&"narrow"));
/// assert_eq!(table.lookup_u32(0x0a020304), Some(&"broad"));
/// assert_eq!(table.lookup(&[192, 168, 0, 1]), None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CompressedLookupTable<V> {
    pub(crate) partition: DepthPartition,
    pub(crate) root: Vec<PackedEntry>,
    pub(crate) dense: DenseStore,
    pub(crate) sparse: SparseStore,
    /// deduplicated results. Index `0` is the "no match" sentinel.
    pub(crate) results: Vec<Option<V>>,
}

impl<V> CompressedLookupTable<V> {
    /// Longest-prefix match of `ip`. The key is read most significant bit first. A key that ends
    /// before the level that would resolve it yields `None`.
    pub fn lookup(&self, ip: &[u8]) -> Option<&V> {
        let depths = self.partition.depths();
        let mut entry = self.root[extract_bits(ip, 0, depths[0])? as usize];
        let mut offset = depths[0] as usize;
        let mut level = 1;
        loop {
            entry = match entry.unpack() {
                LookupEntry::Leaf(index) => return self.results[index as usize].as_ref(),
                LookupEntry::Dense(block) => {
                    let key = extract_bits(ip, offset, depths[level])?;
                    self.dense.get(block, key)
                }
                LookupEntry::Sparse(block) => {
                    let key = extract_bits(ip, offset, depths[level])?;
                    self.sparse.get(block, key)
                }
            };
            offset += depths[level] as usize;
            level += 1;
        }
    }

    /// Longest-prefix match of an IPv4 address given as an integer.
    #[inline]
    pub fn lookup_u32(&self, addr: u32) -> Option<&V> {
        self.lookup(&addr.to_be_bytes())
    }

    /// Longest-prefix match of an IPv6 address given as an integer.
    #[inline]
    pub fn lookup_u128(&self, addr: u128) -> Option<&V> {
        self.lookup(&addr.to_be_bytes())
    }

    /// Longest-prefix match of an IP address. The address family must match the keys the table
    /// was built from.
    pub fn lookup_addr(&self, addr: IpAddr) -> Option<&V> {
        match addr {
            IpAddr::V4(addr) => self.lookup(&addr.octets()),
            IpAddr::V6(addr) => self.lookup(&addr.octets()),
        }
    }

    /// The root entry for the leading bits `index`, or `None` if `index` is out of range.
    ///
    /// ```
    /// # use fib_compress::*;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let table = build([([10, 0, 0, 0], 8, 'a'), ([10, 0, 1, 0], 24, 'b')], &[16, 8, 8], 8)?;
    /// assert_eq!(table.root_entry(0x0a01), Some(LookupEntry::Leaf(1)));
    /// assert_eq!(table.root_entry(0x0b00), Some(LookupEntry::NO_MATCH));
    /// assert!(matches!(table.root_entry(0x0a00), Some(LookupEntry::Sparse(_))));
    /// assert_eq!(table.root_entry(1 << 16), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn root_entry(&self, index: usize) -> Option<LookupEntry> {
        self.root.get(index).map(|e| e.unpack())
    }

    /// The deduplicated results. The first element is always `None`.
    pub fn results(&self) -> &[Option<V>] {
        &self.results
    }

    /// The partition of the address bits into levels.
    pub fn partition(&self) -> &DepthPartition {
        &self.partition
    }

    /// Sizes of the encoded structures.
    pub fn stats(&self) -> TableStats {
        let root_bytes = self.root.len() * std::mem::size_of::<PackedEntry>();
        let result_bytes = self.results.len() * std::mem::size_of::<Option<V>>();
        TableStats {
            levels: self.partition.levels(),
            root_slots: self.root.len(),
            dense_blocks: self.dense.len(),
            dense_groups: self.dense.group_count(),
            dense_entries: self.dense.entry_count(),
            sparse_blocks: self.sparse.len(),
            sparse_entries: self.sparse.entry_count(),
            results: self.results.len() - 1,
            memory_bytes: root_bytes
                + self.dense.memory_bytes()
                + self.sparse.memory_bytes()
                + result_bytes,
        }
    }
}

/// Sizes of a [`CompressedLookupTable`], as returned by [`CompressedLookupTable::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Number of levels of the partition.
    pub levels: usize,
    /// Entries of the root array.
    pub root_slots: usize,
    /// Number of dense blocks.
    pub dense_blocks: usize,
    /// Groups of 64 slots over all dense blocks.
    pub dense_groups: usize,
    /// Stored (non-default) entries over all dense blocks.
    pub dense_entries: usize,
    /// Number of sparse blocks.
    pub sparse_blocks: usize,
    /// Entries over all sparse blocks, including their defaults.
    pub sparse_entries: usize,
    /// Distinct results, without the "no match" sentinel.
    pub results: usize,
    /// Estimated heap size of the table, not counting heap data owned by the results.
    pub memory_bytes: usize,
}

/// The most frequent entry; ties go to the one that occurs first.
pub(crate) fn most_frequent(entries: &[PackedEntry]) -> PackedEntry {
    let mut counts: HashMap<PackedEntry, (usize, usize)> = HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        counts.entry(*entry).or_insert((0, i)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(entry, _)| entry)
        .unwrap_or(PackedEntry::NO_MATCH)
}
