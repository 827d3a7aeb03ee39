//! Binary radix trie keyed by prefix bits. It is the reference for longest-prefix matching and the
//! input to the [`crate::LayeredArrayBuilder`].

use crate::bits::bit_at;
use crate::error::{Error, Result};
use crate::prefix::{BitPrefix, Prefix};

mod iter;
#[cfg(feature = "ipnet")]
mod range;

pub use iter::*;

/// Maximal prefix length stored in the trie.
pub const MAX_PREFIX_LEN: u32 = 128;

/// Binary trie mapping prefixes to values. Each node corresponds to exactly one bit of the key:
/// bit `0` follows the left child, bit `1` the right one. A node that carries a value is a leaf in
/// the sense of longest-prefix matching, even if it has children below.
///
/// ```
/// # use fib_compress::*;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut trie = BinaryTrie::new();
/// trie.insert(&[10, 0, 0, 0], 8, "broad")?;
/// trie.insert(&[10, 1, 0, 0], 16, "narrow")?;
/// assert_eq!(trie.lookup(&[10, 1, 2, 3]), Some(&"narrow"));
/// assert_eq!(trie.lookup(&[10, 2, 3, 4]), Some(&"broad"));
/// assert_eq!(trie.lookup(&[11, 0, 0, 0]), None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BinaryTrie<V> {
    pub(crate) table: Vec<Node<V>>,
    free: Vec<usize>,
    count: usize,
}

/// A single node of the trie, stored in the table and referenced by index.
#[derive(Clone)]
pub(crate) struct Node<V> {
    pub(crate) value: Option<V>,
    pub(crate) left: Option<usize>,
    pub(crate) right: Option<usize>,
}

impl<V> Node<V> {
    fn empty() -> Self {
        Self {
            value: None,
            left: None,
            right: None,
        }
    }

    #[inline(always)]
    pub(crate) fn has_children(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }

    /// A node carrying a value without any children below.
    #[inline(always)]
    fn is_bare_leaf(&self) -> bool {
        self.value.is_some() && !self.has_children()
    }
}

impl<V> Default for BinaryTrie<V> {
    fn default() -> Self {
        Self {
            table: vec![Node::empty()],
            free: Vec::new(),
            count: 0,
        }
    }
}

impl<V> BinaryTrie<V> {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value for the first `prefix_len` bits of `key`. If the prefix was already present,
    /// its value is replaced and the old one is returned (last write wins).
    ///
    /// Fails with [`Error::PrefixLength`] if `prefix_len` exceeds the bits of `key`, and with
    /// [`Error::PrefixTooLong`] if it exceeds 128 bits.
    ///
    /// ```
    /// # use fib_compress::*;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie = BinaryTrie::new();
    /// assert_eq!(trie.insert(&[192, 168, 0, 0], 16, 1)?, None);
    /// assert_eq!(trie.insert(&[192, 168, 0, 0], 16, 2)?, Some(1));
    /// assert!(trie.insert(&[192, 168], 24, 3).is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn insert(&mut self, key: &[u8], prefix_len: u32, value: V) -> Result<Option<V>> {
        let key_bits = (key.len() * 8) as u32;
        if prefix_len > key_bits {
            return Err(Error::PrefixLength {
                prefix_len,
                key_bits,
            });
        }
        if prefix_len > MAX_PREFIX_LEN {
            return Err(Error::PrefixTooLong {
                prefix_len,
                max: MAX_PREFIX_LEN,
            });
        }
        Ok(self.insert_path(prefix_len as usize, |bit| bit_at(key, bit), value))
    }

    /// Insert any [`Prefix`], for instance an `ipnet::Ipv4Net`.
    ///
    /// ```
    /// # use fib_compress::*;
    /// # use ipnet::Ipv4Net;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie = BinaryTrie::new();
    /// let net: Ipv4Net = "10.0.0.0/8".parse()?;
    /// trie.insert_prefix(&net, "ten")?;
    /// assert_eq!(trie.lookup_u32(0x0a010203), Some(&"ten"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn insert_prefix<P: Prefix>(&mut self, prefix: &P, value: V) -> Result<Option<V>> {
        self.insert(prefix.key().as_ref(), prefix.prefix_len() as u32, value)
    }

    /// Insert a prefix whose length is known to be valid.
    pub(crate) fn insert_bits(&mut self, prefix: BitPrefix, value: V) -> Option<V> {
        let bits = prefix.bits();
        self.insert_path(
            prefix.len() as usize,
            |bit| (bits >> (127 - bit)) & 1 == 1,
            value,
        )
    }

    fn insert_path<F>(&mut self, len: usize, bit: F, value: V) -> Option<V>
    where
        F: Fn(usize) -> bool,
    {
        let mut idx = 0;
        for i in 0..len {
            let right = bit(i);
            idx = match self.get_child(idx, right) {
                Some(child) => child,
                None => {
                    let child = self.new_node();
                    self.set_child(idx, child, right);
                    child
                }
            };
        }
        let old = self.table[idx].value.replace(value);
        if old.is_none() {
            self.count += 1;
        }
        old
    }

    /// Get the value stored for exactly the first `prefix_len` bits of `key`, without
    /// longest-prefix matching.
    ///
    /// ```
    /// # use fib_compress::*;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie = BinaryTrie::new();
    /// trie.insert(&[192, 168, 1, 0], 24, 1)?;
    /// assert_eq!(trie.get(&[192, 168, 1, 0], 24), Some(&1));
    /// assert_eq!(trie.get(&[192, 168, 1, 0], 25), None);
    /// assert_eq!(trie.get(&[192, 168, 0, 0], 16), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn get(&self, key: &[u8], prefix_len: u32) -> Option<&V> {
        if prefix_len as usize > key.len() * 8 {
            return None;
        }
        let mut idx = 0;
        for bit in 0..prefix_len as usize {
            idx = self.get_child(idx, bit_at(key, bit))?;
        }
        self.table[idx].value.as_ref()
    }

    /// Longest-prefix match of `key`. At most 128 bits of the key are inspected. A key that ends
    /// before the trie does still returns the deepest value seen on the way.
    pub fn lookup(&self, key: &[u8]) -> Option<&V> {
        let bits = (key.len() * 8).min(MAX_PREFIX_LEN as usize);
        let mut idx = 0;
        let mut best_match = self.table[idx].value.as_ref();
        for bit in 0..bits {
            match self.get_child(idx, bit_at(key, bit)) {
                Some(child) => idx = child,
                None => break,
            }
            best_match = self.table[idx].value.as_ref().or(best_match);
        }
        best_match
    }

    /// Longest-prefix match of an IPv4 address given as an integer.
    pub fn lookup_u32(&self, addr: u32) -> Option<&V> {
        self.lookup(&addr.to_be_bytes())
    }

    /// Longest-prefix match of an IPv6 address given as an integer.
    pub fn lookup_u128(&self, addr: u128) -> Option<&V> {
        self.lookup(&addr.to_be_bytes())
    }

    /// Number of prefixes stored in the trie.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check whether the trie stores no prefix at all.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of nodes in the trie, including the root and nodes without a value.
    pub fn node_count(&self) -> usize {
        self.table.len() - self.free.len()
    }

    /// Length of the longest path from the root, in bits. This is the longest prefix length that
    /// a lookup can reach.
    pub fn max_depth(&self) -> u32 {
        let mut max = 0;
        let mut stack = vec![(0usize, 0u32)];
        while let Some((idx, depth)) = stack.pop() {
            max = max.max(depth);
            let node = &self.table[idx];
            if let Some(left) = node.left {
                stack.push((left, depth + 1));
            }
            if let Some(right) = node.right {
                stack.push((right, depth + 1));
            }
        }
        max
    }

    /// Remove all prefixes.
    pub fn clear(&mut self) {
        self.table.clear();
        self.free.clear();
        self.count = 0;
        self.table.push(Node::empty());
    }

    /// Get the child of a node, either to the left or the right
    #[inline(always)]
    pub(crate) fn get_child(&self, idx: usize, right: bool) -> Option<usize> {
        if right {
            self.table[idx].right
        } else {
            self.table[idx].left
        }
    }

    /// set the child of a node (either to the left or the right), and return the index of the old child.
    #[inline(always)]
    fn set_child(&mut self, idx: usize, child: usize, right: bool) -> Option<usize> {
        if right {
            self.table[idx].right.replace(child)
        } else {
            self.table[idx].left.replace(child)
        }
    }

    /// insert a new node into the table and return its index.
    #[inline(always)]
    fn new_node(&mut self) -> usize {
        if let Some(idx) = self.free.pop() {
            self.table[idx] = Node::empty();
            idx
        } else {
            let idx = self.table.len();
            self.table.push(Node::empty());
            idx
        }
    }

    /// Drop a childless node and return its value.
    fn free_leaf(&mut self, idx: usize) -> Option<V> {
        let value = self.table[idx].value.take();
        if value.is_some() {
            self.count -= 1;
        }
        self.free.push(idx);
        value
    }
}

impl<V: PartialEq> BinaryTrie<V> {
    /// Merge nodes without changing the result of any lookup. In post-order, two childless
    /// siblings with equal values are replaced by their parent carrying that value, and a childless
    /// node is removed when its valued parent has no other child and carries the same value.
    /// Merges cascade upwards within a single pass, so calling this twice changes nothing.
    ///
    /// ```
    /// # use fib_compress::*;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut trie = BinaryTrie::new();
    /// trie.insert(&[0b0000_0000], 1, 'a')?;
    /// trie.insert(&[0b1000_0000], 1, 'a')?;
    /// assert_eq!(trie.node_count(), 3);
    /// trie.compress();
    /// assert_eq!(trie.node_count(), 1);
    /// assert_eq!(trie.lookup(&[0xff]), Some(&'a'));
    /// # Ok(())
    /// # }
    /// ```
    pub fn compress(&mut self) {
        let before = self.node_count();
        self.compress_node(0);
        tracing::debug!(
            nodes_before = before,
            nodes_after = self.node_count(),
            prefixes = self.count,
            "compressed binary trie"
        );
    }

    fn compress_node(&mut self, idx: usize) {
        if let Some(left) = self.table[idx].left {
            self.compress_node(left);
        }
        if let Some(right) = self.table[idx].right {
            self.compress_node(right);
        }

        let node = &self.table[idx];
        match (node.left, node.right) {
            (Some(left), Some(right)) => {
                let (l, r) = (&self.table[left], &self.table[right]);
                if l.is_bare_leaf() && r.is_bare_leaf() && l.value == r.value {
                    self.table[idx].left = None;
                    self.table[idx].right = None;
                    let value = self.free_leaf(left);
                    let _ = self.free_leaf(right);
                    if self.table[idx].value.is_none() {
                        self.count += 1;
                    }
                    self.table[idx].value = value;
                }
            }
            (Some(child), None) | (None, Some(child)) => {
                let c = &self.table[child];
                if node.value.is_some() && c.is_bare_leaf() && c.value == node.value {
                    self.table[idx].left = None;
                    self.table[idx].right = None;
                    let _ = self.free_leaf(child);
                }
            }
            (None, None) => {}
        }
    }
}

impl<V> PartialEq for BinaryTrie<V>
where
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<V> Eq for BinaryTrie<V> where V: Eq {}
