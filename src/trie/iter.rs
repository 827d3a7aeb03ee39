//! Module that contains the implementation for the iterators

use super::BinaryTrie;
use crate::prefix::BitPrefix;

/// An iterator over all prefixes of a [`BinaryTrie`] together with their values, in preorder.
/// Shorter prefixes come before the prefixes they contain, and left (`0`) branches come before
/// right (`1`) branches, which results in lexicographic order.
#[derive(Clone)]
pub struct Iter<'a, V> {
    trie: &'a BinaryTrie<V>,
    nodes: Vec<(usize, BitPrefix)>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (BitPrefix, &'a V);

    fn next(&mut self) -> Option<(BitPrefix, &'a V)> {
        while let Some((cur, prefix)) = self.nodes.pop() {
            let node = &self.trie.table[cur];
            if let Some(right) = node.right {
                self.nodes.push((right, prefix.child(true)));
            }
            if let Some(left) = node.left {
                self.nodes.push((left, prefix.child(false)));
            }
            if let Some(v) = &node.value {
                return Some((prefix, v));
            }
        }
        None
    }
}

impl<V> BinaryTrie<V> {
    /// An iterator visiting all prefixes and their values in lexicographic order.
    ///
    /// ```
    /// # use fib_compress::*;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie = BinaryTrie::new();
    /// trie.insert(&[0b1100_0000], 2, 2)?;
    /// trie.insert(&[0b1000_0000], 1, 1)?;
    /// trie.insert(&[0b0000_0000], 1, 0)?;
    /// let prefixes: Vec<_> = trie.iter().map(|(p, v)| (p.len(), *v)).collect();
    /// assert_eq!(prefixes, vec![(1, 0), (1, 1), (2, 2)]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            trie: self,
            nodes: vec![(0, BitPrefix::root())],
        }
    }
}

impl<'a, V> IntoIterator for &'a BinaryTrie<V> {
    type Item = (BitPrefix, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
