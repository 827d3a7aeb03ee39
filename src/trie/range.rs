//! Insertion of address ranges, decomposed into the smallest set of covering CIDR blocks.

use std::net::{Ipv4Addr, Ipv6Addr};

use ipnet::{Ipv4Subnets, Ipv6Subnets};

use super::BinaryTrie;
use crate::prefix::BitPrefix;

impl<V: Clone> BinaryTrie<V> {
    /// Insert `value` for every address in the inclusive range `start..=end`. The range is split
    /// into CIDR blocks, and the number of inserted prefixes is returned. An empty range (`start >
    /// end`) inserts nothing.
    ///
    /// ```
    /// # use fib_compress::*;
    /// # use std::net::Ipv4Addr;
    /// let mut trie = BinaryTrie::new();
    /// let n = trie.insert_range_v4(Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 0, 2, 255), 7);
    /// assert_eq!(n, 2); // 10.0.0.0/23 and 10.0.2.0/24
    /// assert_eq!(trie.lookup(&[10, 0, 2, 200]), Some(&7));
    /// assert_eq!(trie.lookup(&[10, 0, 3, 0]), None);
    /// ```
    pub fn insert_range_v4(&mut self, start: Ipv4Addr, end: Ipv4Addr, value: V) -> usize {
        let mut inserted = 0;
        for net in Ipv4Subnets::new(start, end, 0) {
            let bits = (u32::from(net.network()) as u128) << 96;
            self.insert_bits(BitPrefix::new(bits, net.prefix_len()), value.clone());
            inserted += 1;
        }
        tracing::trace!(%start, %end, inserted, "inserted IPv4 range");
        inserted
    }

    /// Insert `value` for every address in the inclusive range `start..=end`. See
    /// [`BinaryTrie::insert_range_v4`].
    pub fn insert_range_v6(&mut self, start: Ipv6Addr, end: Ipv6Addr, value: V) -> usize {
        let mut inserted = 0;
        for net in Ipv6Subnets::new(start, end, 0) {
            let bits = u128::from(net.network());
            self.insert_bits(BitPrefix::new(bits, net.prefix_len()), value.clone());
            inserted += 1;
        }
        tracing::trace!(%start, %end, inserted, "inserted IPv6 range");
        inserted
    }
}
