//! Expansion of a [`BinaryTrie`] into nested [`ForwardingArray`]s.

use std::sync::Arc;

use super::{ForwardingArray, ForwardingNode};
use crate::error::{Error, Result};
use crate::partition::DepthPartition;
use crate::trie::BinaryTrie;

/// Builds nested forwarding arrays from a trie, one array depth per level of a
/// [`DepthPartition`].
///
/// ```
/// # use fib_compress::*;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut trie = BinaryTrie::new();
/// trie.insert(&[10, 0, 0, 0], 8, 1)?;
/// trie.insert(&[10, 1, 2, 0], 24, 2)?;
/// let array = LayeredArrayBuilder::new(&DepthPartition::ipv4()).build(&trie)?;
/// assert_eq!(array.slot_count(), 1 << 16);
/// assert_eq!(array.lookup(&[10, 1, 2, 3]), Some(&2));
/// assert_eq!(array.lookup(&[10, 1, 3, 3]), Some(&1));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LayeredArrayBuilder<'a> {
    partition: &'a DepthPartition,
    compact: bool,
}

impl<'a> LayeredArrayBuilder<'a> {
    /// Create a builder for the given partition.
    pub fn new(partition: &'a DepthPartition) -> Self {
        Self {
            partition,
            compact: false,
        }
    }

    /// Store every array as runs of equal slots (see [`ForwardingArray::compact`]).
    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Expand the trie. Fails with [`Error::PrefixTooLong`] if the trie is deeper than the
    /// partition is wide.
    pub fn build<V: Clone + PartialEq>(&self, trie: &BinaryTrie<V>) -> Result<ForwardingArray<V>> {
        let width = self.partition.width();
        let depth = trie.max_depth();
        if depth > width {
            return Err(Error::PrefixTooLong {
                prefix_len: depth,
                max: width,
            });
        }
        let root = self.build_level(trie, 0, 0, None);
        tracing::debug!(
            levels = self.partition.levels(),
            arrays = root.array_count(),
            compact = self.compact,
            "built forwarding arrays"
        );
        Ok(root)
    }

    /// Build the array of `level`, whose root is trie node `idx`. Every slot starts with the
    /// inherited `default`.
    fn build_level<V: Clone + PartialEq>(
        &self,
        trie: &BinaryTrie<V>,
        idx: usize,
        level: usize,
        default: Option<&V>,
    ) -> ForwardingArray<V> {
        let depth = self.partition.depths()[level];
        let mut array = ForwardingArray::filled(
            depth,
            Arc::new(ForwardingNode {
                value: default.cloned(),
                next: None,
            }),
        );
        let span = Span {
            trie,
            level,
            depth,
        };
        self.fill(&span, &mut array, idx, 0, 0, default);
        if self.compact {
            array.compact();
        }
        array
    }

    /// Fill the slots below trie node `idx`, which sits `consumed` bits below the root of the
    /// array and covers the slots starting with the bits `index`.
    fn fill<V: Clone + PartialEq>(
        &self,
        span: &Span<'_, V>,
        array: &mut ForwardingArray<V>,
        idx: usize,
        consumed: u8,
        index: usize,
        best: Option<&V>,
    ) {
        let node = &span.trie.table[idx];
        let best = node.value.as_ref().or(best);

        if consumed == span.depth {
            let next = if node.has_children() && span.level + 1 < self.partition.levels() {
                Some(self.build_level(span.trie, idx, span.level + 1, best))
            } else {
                None
            };
            if node.value.is_some() || next.is_some() {
                let slot = Arc::new(ForwardingNode {
                    value: best.cloned(),
                    next,
                });
                array.fill(index..index + 1, &slot);
            }
            return;
        }

        if node.value.is_some() {
            let shift = span.depth - consumed;
            let lo = index << shift;
            let slot = Arc::new(ForwardingNode {
                value: node.value.clone(),
                next: None,
            });
            array.fill(lo..lo + (1 << shift), &slot);
        }
        if let Some(left) = node.left {
            self.fill(span, array, left, consumed + 1, index << 1, best);
        }
        if let Some(right) = node.right {
            self.fill(span, array, right, consumed + 1, (index << 1) | 1, best);
        }
    }
}

/// The level currently being filled.
struct Span<'t, V> {
    trie: &'t BinaryTrie<V>,
    level: usize,
    depth: u8,
}
