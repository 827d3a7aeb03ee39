//! Formatting implementations for the trie, the forwarding arrays and the compressed table.

use std::fmt::{Debug, Display, Formatter, Result};
use std::sync::Arc;

use crate::array::ForwardingArray;
use crate::prefix::BitPrefix;
use crate::table::{CompressedLookupTable, TableStats};
use crate::trie::BinaryTrie;

impl Debug for BitPrefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for i in 0..self.len() as u32 {
            let bit = (self.bits() >> (127 - i)) & 1;
            write!(f, "{bit}")?;
        }
        write!(f, "/{}", self.len())
    }
}

impl<V: Debug> Debug for BinaryTrie<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        DebugBinaryTrie(self, 0, BitPrefix::root()).fmt(f)
    }
}

struct DebugBinaryTrie<'a, V>(&'a BinaryTrie<V>, usize, BitPrefix);

impl<V: Debug> Debug for DebugBinaryTrie<'_, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let trie = self.0;
        let prefix = self.2;
        let node = &trie.table[self.1];
        let child = |idx: usize, right: bool| Self(trie, idx, prefix.child(right));
        match (node.value.as_ref(), node.left, node.right) {
            (None, None, None) => prefix.fmt(f),
            (None, None, Some(c)) => f.debug_map().entry(&prefix, &child(c, true)).finish(),
            (None, Some(c), None) => f.debug_map().entry(&prefix, &child(c, false)).finish(),
            (None, Some(left), Some(right)) => f
                .debug_map()
                .entry(&prefix, &(child(left, false), child(right, true)))
                .finish(),
            (Some(v), None, None) => f.debug_map().entry(&prefix, v).finish(),
            (Some(v), None, Some(c)) => f
                .debug_map()
                .entry(&prefix, &(v, child(c, true)))
                .finish(),
            (Some(v), Some(c), None) => f
                .debug_map()
                .entry(&prefix, &(v, child(c, false)))
                .finish(),
            (Some(v), Some(left), Some(right)) => f
                .debug_map()
                .entry(&prefix, &(v, child(left, false), child(right, true)))
                .finish(),
        }
    }
}

/// Prints every run of slots sharing a node once, keyed by its slot range.
impl<V: Debug> Debug for ForwardingArray<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let mut map = f.debug_map();
        let mut run: Option<(usize, &Arc<_>)> = None;
        for (i, node) in self.iter_shared().enumerate() {
            match run {
                Some((_, prev)) if Arc::ptr_eq(prev, node) => {}
                Some((start, prev)) => {
                    map.entry(&(start..i), prev);
                    run = Some((i, node));
                }
                None => run = Some((i, node)),
            }
        }
        if let Some((start, prev)) = run {
            map.entry(&(start..self.slot_count()), prev);
        }
        map.finish()
    }
}

impl<V: Debug> Debug for CompressedLookupTable<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("CompressedLookupTable")
            .field("partition", &self.partition.depths())
            .field("stats", &self.stats())
            .field("results", &&self.results[1..])
            .finish()
    }
}

impl Display for TableStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "levels:        {}", self.levels)?;
        writeln!(f, "root slots:    {}", self.root_slots)?;
        writeln!(
            f,
            "dense blocks:  {} ({} groups, {} entries)",
            self.dense_blocks, self.dense_groups, self.dense_entries
        )?;
        writeln!(
            f,
            "sparse blocks: {} ({} entries)",
            self.sparse_blocks, self.sparse_entries
        )?;
        writeln!(f, "results:       {}", self.results)?;
        write!(f, "memory:        {:.2} KiB", self.memory_bytes as f64 / 1024.0)
    }
}
