//! Forwarding arrays: the trie expanded into fixed-depth flat arrays, one per level of a
//! [`crate::DepthPartition`].

use std::sync::Arc;

use crate::bits::extract_bits;

mod builder;

pub use builder::LayeredArrayBuilder;

/// A slot of a [`ForwardingArray`]. A slot with both a value and a nested array carries a default
/// for all addresses that the nested array does not override.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardingNode<V> {
    pub(crate) value: Option<V>,
    pub(crate) next: Option<ForwardingArray<V>>,
}

impl<V> ForwardingNode<V> {
    /// The longest match for every address reaching this slot (unless overridden below).
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// The array for the next level, if the trie has more structure below this slot.
    pub fn next(&self) -> Option<&ForwardingArray<V>> {
        self.next.as_ref()
    }
}

/// A flat array of `2^depth` slots. Consecutive slots covered by the same trie node share the
/// same [`ForwardingNode`].
#[derive(Clone)]
pub struct ForwardingArray<V> {
    depth: u8,
    slots: Slots<V>,
}

#[derive(Clone)]
enum Slots<V> {
    Flat(Vec<Arc<ForwardingNode<V>>>),
    Runs(Runs<V>),
}

/// Compacted slots: one node per run of equal slots, and a bitmap marking where each run starts.
#[derive(Clone)]
struct Runs<V> {
    starts: Vec<u64>,
    /// number of run starts in all preceding words
    ranks: Vec<u32>,
    nodes: Vec<Arc<ForwardingNode<V>>>,
}

impl<V> Runs<V> {
    #[inline]
    fn get(&self, index: usize) -> &Arc<ForwardingNode<V>> {
        let word = index / 64;
        let bit = index % 64;
        let rank = self.ranks[word] + (self.starts[word] << (63 - bit)).count_ones();
        &self.nodes[rank as usize - 1]
    }
}

impl<V> ForwardingArray<V> {
    /// Create an array with every slot pointing to `node`.
    pub(crate) fn filled(depth: u8, node: Arc<ForwardingNode<V>>) -> Self {
        Self {
            depth,
            slots: Slots::Flat(vec![node; 1 << depth]),
        }
    }

    /// Number of address bits consumed by this array.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Number of slots, `2^depth`. An array always has at least one slot.
    pub fn slot_count(&self) -> usize {
        1 << self.depth
    }

    /// Get the slot at `index`, or `None` if `index` is out of range.
    pub fn get(&self, index: usize) -> Option<&ForwardingNode<V>> {
        (index < self.slot_count()).then(|| self.shared(index).as_ref())
    }

    pub(crate) fn shared(&self, index: usize) -> &Arc<ForwardingNode<V>> {
        match &self.slots {
            Slots::Flat(nodes) => &nodes[index],
            Slots::Runs(runs) => runs.get(index),
        }
    }

    /// Iterate over all slots in order.
    pub fn iter(&self) -> impl Iterator<Item = &ForwardingNode<V>> + '_ {
        self.iter_shared().map(|node| node.as_ref())
    }

    pub(crate) fn iter_shared(&self) -> impl Iterator<Item = &Arc<ForwardingNode<V>>> + '_ {
        (0..self.slot_count()).map(move |i| self.shared(i))
    }

    /// Point all slots in `range` to `node`. Only valid before compaction.
    pub(crate) fn fill(&mut self, range: std::ops::Range<usize>, node: &Arc<ForwardingNode<V>>) {
        if let Slots::Flat(nodes) = &mut self.slots {
            for slot in &mut nodes[range] {
                *slot = Arc::clone(node);
            }
        }
    }

    /// Check whether the array stores runs instead of one entry per slot.
    pub fn is_compact(&self) -> bool {
        matches!(self.slots, Slots::Runs(_))
    }

    /// Number of stored slot nodes: `2^depth` for a flat array, one per run once compacted.
    pub fn stored_nodes(&self) -> usize {
        match &self.slots {
            Slots::Flat(nodes) => nodes.len(),
            Slots::Runs(runs) => runs.nodes.len(),
        }
    }

    /// Number of arrays, including this one and all nested arrays.
    pub fn array_count(&self) -> usize {
        1 + self
            .distinct_nodes()
            .filter_map(|node| node.next.as_ref())
            .map(|next| next.array_count())
            .sum::<usize>()
    }

    /// Slot nodes with consecutive duplicates (by identity) removed.
    fn distinct_nodes(&self) -> impl Iterator<Item = &Arc<ForwardingNode<V>>> + '_ {
        let mut last: Option<&Arc<ForwardingNode<V>>> = None;
        self.iter_shared().filter(move |node| {
            let new = !matches!(last, Some(prev) if Arc::ptr_eq(prev, node));
            last = Some(*node);
            new
        })
    }

    /// Longest-prefix match of `key`, walking the nested arrays. A key that ends before the next
    /// level returns the deepest value found so far.
    pub fn lookup(&self, key: &[u8]) -> Option<&V> {
        let mut best_match = None;
        let mut current = Some(self);
        let mut offset = 0;
        while let Some(array) = current {
            let Some(index) = extract_bits(key, offset, array.depth) else {
                break;
            };
            let node = array.shared(index as usize);
            best_match = node.value.as_ref().or(best_match);
            offset += array.depth as usize;
            current = node.next.as_ref();
        }
        best_match
    }
}

impl<V: PartialEq> ForwardingArray<V> {
    /// Merge every run of consecutive equal slots into a single node, and store the runs together
    /// with a bitmap of their start positions. Lookups are unaffected.
    pub fn compact(&mut self) {
        if self.is_compact() {
            return;
        }
        let len = self.slot_count();
        let words = (len + 63) / 64;
        let mut starts = vec![0u64; words];
        let mut nodes: Vec<Arc<ForwardingNode<V>>> = Vec::new();
        for (i, node) in self.iter_shared().enumerate() {
            let same = match nodes.last() {
                Some(prev) => Arc::ptr_eq(prev, node) || prev == node,
                None => false,
            };
            if !same {
                starts[i / 64] |= 1 << (i % 64);
                nodes.push(Arc::clone(node));
            }
        }
        let mut ranks = Vec::with_capacity(words);
        let mut rank = 0;
        for word in &starts {
            ranks.push(rank);
            rank += word.count_ones();
        }
        self.slots = Slots::Runs(Runs {
            starts,
            ranks,
            nodes,
        });
    }
}

impl<V: PartialEq> PartialEq for ForwardingArray<V> {
    fn eq(&self, other: &Self) -> bool {
        self.depth == other.depth
            && self
                .iter_shared()
                .zip(other.iter_shared())
                .all(|(a, b)| Arc::ptr_eq(a, b) || a == b)
    }
}

impl<V: Eq> Eq for ForwardingArray<V> {}
