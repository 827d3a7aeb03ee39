//! Compression of forwarding arrays into a [`CompressedLookupTable`].

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use super::dense::{self, DenseStore};
use super::entry::{LookupEntry, PackedEntry, MAX_ENTRY_INDEX};
use super::sparse::{self, SparseStore};
use super::CompressedLookupTable;
use crate::array::{ForwardingArray, ForwardingNode, LayeredArrayBuilder};
use crate::error::{Error, Result};
use crate::partition::DepthPartition;
use crate::trie::BinaryTrie;

/// Default dense/sparse threshold.
pub const DEFAULT_K: u32 = 8;

/// Configuration of a table build.
///
/// A block of the compressed table is encoded dense if it holds more than `k` distinct entries,
/// and sparse otherwise. Small values of `k` favor lookup speed, large values favor size.
///
/// ```
/// # use fib_compress::*;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let table = TableBuilder::new(DepthPartition::ipv4())
///     .k(4)
///     .build([([10, 0, 0, 0], 8, "ten"), ([10, 1, 0, 0], 16, "ten-one")])?;
/// assert_eq!(table.lookup(&[10, 1, 2, 3]), Some(&"ten-one"));
/// assert_eq!(table.lookup(&[10, 2, 2, 3]), Some(&"ten"));
/// assert_eq!(table.lookup(&[11, 0, 0, 0]), None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableBuilder {
    partition: DepthPartition,
    #[cfg_attr(feature = "serde", serde(default = "default_k"))]
    k: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    compact_arrays: bool,
}

#[cfg(feature = "serde")]
fn default_k() -> u32 {
    DEFAULT_K
}

impl TableBuilder {
    /// Create a builder with the default threshold.
    pub fn new(partition: DepthPartition) -> Self {
        Self {
            partition,
            k: DEFAULT_K,
            compact_arrays: false,
        }
    }

    /// Set the dense/sparse threshold.
    pub fn k(mut self, k: u32) -> Self {
        self.k = k;
        self
    }

    /// Compact the intermediate forwarding arrays while building. This lowers the peak memory of
    /// the build and does not change the resulting table.
    pub fn compact_arrays(mut self, compact: bool) -> Self {
        self.compact_arrays = compact;
        self
    }

    /// The configured partition.
    pub fn partition(&self) -> &DepthPartition {
        &self.partition
    }

    /// The configured dense/sparse threshold.
    pub fn threshold(&self) -> u32 {
        self.k
    }

    /// Build a table from `(key, prefix_len, value)` tuples. Later duplicates of a prefix replace
    /// earlier ones.
    ///
    /// Every key must be exactly as wide as the partition, e.g. 4 bytes for a 32 bit partition.
    /// Fails if a key has a different width, or if a prefix is longer than its key. Nothing is
    /// built in that case.
    pub fn build<V, I, K>(&self, prefixes: I) -> Result<CompressedLookupTable<V>>
    where
        V: Clone + Eq + Hash,
        I: IntoIterator<Item = (K, u32, V)>,
        K: AsRef<[u8]>,
    {
        let width = self.partition.width();
        let mut trie = BinaryTrie::new();
        for (key, prefix_len, value) in prefixes {
            let key = key.as_ref();
            let key_bits = (key.len() * 8) as u32;
            if key_bits != width {
                return Err(Error::KeyWidth { key_bits, width });
            }
            trie.insert(key, prefix_len, value)?;
        }
        tracing::debug!(
            prefixes = trie.len(),
            nodes = trie.node_count(),
            "loaded prefixes into binary trie"
        );
        trie.compress();
        self.build_from_trie(&trie)
    }

    /// Build a table from a trie. The trie is not compressed first; lookups are the same either
    /// way.
    pub fn build_from_trie<V>(&self, trie: &BinaryTrie<V>) -> Result<CompressedLookupTable<V>>
    where
        V: Clone + Eq + Hash,
    {
        let array = LayeredArrayBuilder::new(&self.partition)
            .compact(self.compact_arrays)
            .build(trie)?;
        self.build_from_array(&array)
    }

    /// Compress nested forwarding arrays. Every array must have the depth of its level in the
    /// partition, or the build fails with [`Error::ArrayShape`].
    pub fn build_from_array<V>(
        &self,
        array: &ForwardingArray<V>,
    ) -> Result<CompressedLookupTable<V>>
    where
        V: Clone + Eq + Hash,
    {
        let depths = self.partition.depths();
        check_shape(array, depths, 0)?;

        let mut compressor = Compressor {
            depths,
            k: self.k,
            dense: DenseStore::default(),
            sparse: SparseStore::default(),
            results: vec![None],
            index: HashMap::new(),
            memo: HashMap::new(),
            memo_hits: 0,
        };
        let root = compressor.slots(array, 0)?;

        tracing::debug!(
            root_slots = root.len(),
            dense_blocks = compressor.dense.len(),
            sparse_blocks = compressor.sparse.len(),
            results = compressor.results.len() - 1,
            memo_hits = compressor.memo_hits,
            "built compressed lookup table"
        );

        Ok(CompressedLookupTable {
            partition: self.partition.clone(),
            root,
            dense: compressor.dense,
            sparse: compressor.sparse,
            results: compressor.results,
        })
    }
}

fn check_shape<V>(array: &ForwardingArray<V>, depths: &[u8], level: usize) -> Result<()> {
    let expected = depths.get(level).copied().unwrap_or(0);
    if array.depth() != expected {
        return Err(Error::ArrayShape {
            level,
            expected,
            found: array.depth(),
        });
    }
    Ok(())
}

/// State of a single build: the block stores, the deduplicated results and the memo of encoded
/// blocks.
struct Compressor<'a, V> {
    depths: &'a [u8],
    k: u32,
    dense: DenseStore,
    sparse: SparseStore,
    results: Vec<Option<V>>,
    index: HashMap<V, u32>,
    /// blocks already encoded, by level and slot entries
    memo: HashMap<(usize, Vec<PackedEntry>), PackedEntry>,
    memo_hits: usize,
}

impl<'a, V: Clone + Eq + Hash> Compressor<'a, V> {
    /// Entries of all slots of an array at `level`. Runs of slots sharing the same node are only
    /// resolved once.
    fn slots(&mut self, array: &ForwardingArray<V>, level: usize) -> Result<Vec<PackedEntry>> {
        let mut slots = Vec::with_capacity(array.slot_count());
        let mut last: Option<(&Arc<ForwardingNode<V>>, PackedEntry)> = None;
        for node in array.iter_shared() {
            let entry = match last {
                Some((prev, entry)) if Arc::ptr_eq(prev, node) => entry,
                _ => self.node_entry(node, level)?,
            };
            last = Some((node, entry));
            slots.push(entry);
        }
        Ok(slots)
    }

    /// The entry of a single slot of an array at `level`.
    fn node_entry(&mut self, node: &ForwardingNode<V>, level: usize) -> Result<PackedEntry> {
        match &node.next {
            // the nested array inherits the value of the slot
            Some(next) => self.block(next, level + 1),
            None => self.result(node.value.as_ref()),
        }
    }

    /// Encode the array of `level` as a dense or sparse block.
    fn block(&mut self, array: &ForwardingArray<V>, level: usize) -> Result<PackedEntry> {
        check_shape(array, self.depths, level)?;
        let key = (level, self.slots(array, level)?);
        if let Some(entry) = self.memo.get(&key) {
            self.memo_hits += 1;
            return Ok(*entry);
        }
        let slots = &key.1;

        let distinct = slots.iter().collect::<HashSet<_>>().len();
        let entry = if distinct == 1 && !slots[0].is_block() {
            // a uniform block resolves to its only result
            slots[0]
        } else if distinct as u64 > self.k as u64 {
            let index = self.dense.push(dense::encode(slots))?;
            PackedEntry::pack(LookupEntry::Dense(index))
        } else {
            let index = self.sparse.push(sparse::encode(slots, self.depths[level]))?;
            PackedEntry::pack(LookupEntry::Sparse(index))
        };
        tracing::trace!(level, distinct, entry = ?entry, "encoded block");

        self.memo.insert(key, entry);
        Ok(entry)
    }

    /// Index of `value` in the deduplicated result list.
    fn result(&mut self, value: Option<&V>) -> Result<PackedEntry> {
        let Some(value) = value else {
            return Ok(PackedEntry::NO_MATCH);
        };
        if let Some(index) = self.index.get(value) {
            return Ok(PackedEntry::pack(LookupEntry::Leaf(*index)));
        }
        let index = self.results.len();
        if index > MAX_ENTRY_INDEX as usize {
            return Err(Error::Capacity {
                what: "results",
                limit: MAX_ENTRY_INDEX,
            });
        }
        self.results.push(Some(value.clone()));
        self.index.insert(value.clone(), index as u32);
        Ok(PackedEntry::pack(LookupEntry::Leaf(index as u32)))
    }
}
