//! Sparse blocks: a short list of prefix/mask entries that is scanned linearly.
//!
//! The slots of a block are inserted into a temporary [`BinaryTrie`] keyed by the slot index and
//! compressed, so every run of slots sharing an aligned power-of-two range collapses into a single
//! prefix. The value covering most of those prefixes becomes the catch-all default, and all other
//! prefixes are emitted most specific first.

use super::entry::{PackedEntry, MAX_ENTRY_INDEX};
use super::most_frequent;
use crate::error::{Error, Result};
use crate::prefix::{mask_from_prefix_len, BitPrefix};
use crate::trie::BinaryTrie;

/// A single entry of a sparse block. A key of the block's depth matches if
/// `key & mask == prefix`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SparseEntry {
    pub(crate) prefix: u16,
    pub(crate) mask: u16,
    pub(crate) len: u8,
    pub(crate) entry: PackedEntry,
}

impl SparseEntry {
    fn new(prefix: BitPrefix, depth: u8, entry: PackedEntry) -> Self {
        Self {
            prefix: prefix.right_aligned(depth) as u16,
            mask: mask_from_prefix_len::<u16>(prefix.len()) >> (16 - depth as u32),
            len: prefix.len(),
            entry,
        }
    }

    #[inline(always)]
    fn matches(&self, key: u32) -> bool {
        key as u16 & self.mask == self.prefix
    }
}

/// Encode the `2^depth` slots of one block. The last entry always has length zero.
pub(crate) fn encode(slots: &[PackedEntry], depth: u8) -> Vec<SparseEntry> {
    debug_assert_eq!(slots.len(), 1 << depth);
    let mut trie = BinaryTrie::new();
    for (i, entry) in slots.iter().enumerate() {
        let bits = (i as u128) << (128 - depth as u32);
        trie.insert_bits(BitPrefix::new(bits, depth), *entry);
    }
    trie.compress();

    let leaves: Vec<(BitPrefix, PackedEntry)> = trie.iter().map(|(p, e)| (p, *e)).collect();
    let values: Vec<PackedEntry> = leaves.iter().map(|(_, e)| *e).collect();
    let default = most_frequent(&values);

    let mut entries: Vec<SparseEntry> = leaves
        .into_iter()
        .filter(|(_, e)| *e != default)
        .map(|(p, e)| SparseEntry::new(p, depth, e))
        .collect();
    entries.sort_by(|a, b| b.len.cmp(&a.len).then(a.prefix.cmp(&b.prefix)));
    entries.push(SparseEntry {
        prefix: 0,
        mask: 0,
        len: 0,
        entry: default,
    });
    entries
}

/// All sparse blocks of a table, stored back to back.
#[derive(Clone, Debug, Default)]
pub(crate) struct SparseStore {
    /// offset and number of entries of every block
    blocks: Vec<(u32, u32)>,
    entries: Vec<SparseEntry>,
}

impl SparseStore {
    /// Append a block and return its index.
    pub(crate) fn push(&mut self, entries: Vec<SparseEntry>) -> Result<u32> {
        let index = self.blocks.len();
        if index > MAX_ENTRY_INDEX as usize {
            return Err(Error::Capacity {
                what: "sparse blocks",
                limit: MAX_ENTRY_INDEX,
            });
        }
        if self.entries.len() + entries.len() > u32::MAX as usize {
            return Err(Error::Capacity {
                what: "sparse block entries",
                limit: u32::MAX,
            });
        }
        self.blocks
            .push((self.entries.len() as u32, entries.len() as u32));
        self.entries.extend(entries);
        Ok(index as u32)
    }

    /// Resolve `key` in block `block`: the first matching entry wins.
    #[inline]
    pub(crate) fn get(&self, block: u32, key: u32) -> PackedEntry {
        let (start, len) = self.blocks[block as usize];
        let entries = &self.entries[start as usize..(start + len) as usize];
        entries
            .iter()
            .find(|e| e.matches(key))
            .map(|e| e.entry)
            .unwrap_or(PackedEntry::NO_MATCH)
    }

    /// The entries of a block, in scan order.
    pub(crate) fn block(&self, block: u32) -> &[SparseEntry] {
        let (start, len) = self.blocks[block as usize];
        &self.entries[start as usize..(start + len) as usize]
    }

    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn memory_bytes(&self) -> usize {
        self.blocks.len() * std::mem::size_of::<(u32, u32)>()
            + self.entries.len() * std::mem::size_of::<SparseEntry>()
    }
}
