//! This crate compiles a set of IP prefixes with associated values (a forwarding table) into a
//! compact, immutable lookup structure that answers longest-prefix-match queries. It supports both
//! IPv4 and IPv6, prefixes from [ipnet](https://docs.rs/ipnet/2.10.0), and any tuple `(R, u8)`
//! where `R` is an unsigned primitive integer.
//!
//! ```
//! # use fib_compress::*;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = build(
//!     [
//!         ([10, 0, 0, 0], 8, "broad"),
//!         ([10, 1, 0, 0], 16, "narrow"),
//!         ([10, 1, 2, 0], 24, "narrower"),
//!     ],
//!     &[16, 8, 8],
//!     8,
//! )?;
//! assert_eq!(table.lookup(&[10, 1, 2, 100]), Some(&"narrower"));
//! assert_eq!(table.lookup(&[10, 1, 3, 1]), Some(&"narrow"));
//! assert_eq!(table.lookup(&[10, 2, 3, 4]), Some(&"broad"));
//! assert_eq!(table.lookup(&[11, 0, 0, 0]), None);
//! # Ok(())
//! # }
//! ```
//!
//! # Build pipeline
//!
//! A table is built in three steps:
//!
//! 1. All prefixes are inserted into a [`BinaryTrie`], one node per prefix bit. Re-inserting a
//!    prefix replaces its value. [`BinaryTrie::compress`] then merges sibling leaves with equal
//!    values into their parent.
//! 2. A [`LayeredArrayBuilder`] expands the trie into nested [`ForwardingArray`]s, one array depth
//!    per level of a [`DepthPartition`]. For IPv4, the conventional partition `16, 8, 8` yields a
//!    root array of 65536 slots, and an array of 256 slots below every root slot that still has
//!    more specific prefixes.
//! 3. A [`TableBuilder`] compresses every nested array into a *dense* or a *sparse* block and
//!    deduplicates all values into a shared result list. The root array is kept as a flat array of
//!    [`LookupEntry`]s.
//!
//! The trie and the forwarding arrays both answer lookups on their own, and serve as reference
//! implementations for the compressed table.
//!
//! # Blocks
//!
//! A [`LookupEntry`] is either a leaf (an index into the result list, where `0` means no match),
//! or the index of a dense or sparse block for the next level. Internally, entries are packed into
//! 32 bits: a 2-bit tag and a 30-bit index.
//!
//! - *Dense* blocks are split into groups of 64 slots and clusters of 8 slots. Each cluster stores
//!   an 8-bit presence bitmap of the slots that differ from the group default, and the number of
//!   present slots in the preceding clusters. A lookup needs a single popcount.
//! - *Sparse* blocks store a short list of `(prefix, mask)` entries, most specific first and a
//!   catch-all default last. A lookup scans the list linearly.
//!
//! A block with more than `k` distinct entries is encoded dense, all others sparse. Blocks with
//! identical content are only stored once.
//!
//! # Logging
//!
//! Build steps emit [`tracing`](https://docs.rs/tracing) events at the `debug` level, and every
//! encoded block at the `trace` level. Lookups never log. The crate does not install a
//! subscriber.
//!
//! # Features
//!
//! - `ipnet` (default): [`Prefix`] implementations for `ipnet` types and
//!   [`BinaryTrie::insert_range_v4`] / [`BinaryTrie::insert_range_v6`].
//! - `serde`: (de)serialization of [`BinaryTrie`], [`DepthPartition`] and [`TableBuilder`].

#![allow(clippy::collapsible_else_if)]
#![deny(missing_docs)]

use std::hash::Hash;

mod array;
mod bits;
mod error;
mod fmt;
mod partition;
mod prefix;
#[cfg(feature = "serde")]
mod serde;
mod table;
mod trie;

#[cfg(test)]
mod fuzzing;

pub use array::{ForwardingArray, ForwardingNode, LayeredArrayBuilder};
pub use error::{Error, Result};
pub use partition::{DepthPartition, MAX_LEVEL_DEPTH, MAX_ROOT_DEPTH};
pub use prefix::{BitPrefix, KeyBytes, Prefix, MAX_KEY_BYTES};
pub use table::{
    CompressedLookupTable, LookupEntry, TableBuilder, TableStats, DEFAULT_K, MAX_ENTRY_INDEX,
};
pub use trie::{BinaryTrie, Iter, MAX_PREFIX_LEN};

/// Build a [`CompressedLookupTable`] from `(key, prefix_len, value)` tuples.
///
/// `depth_partition` lists the number of address bits consumed by each level, e.g. `[16, 8, 8]`
/// for IPv4. A block is encoded dense if it holds more than `k` distinct entries. This is a
/// shorthand for [`TableBuilder::build`].
///
/// Fails if the partition is invalid, if a key is not exactly as wide as the partition, or if a
/// prefix is longer than its key.
pub fn build<V, I, K>(prefixes: I, depth_partition: &[u32], k: u32) -> Result<CompressedLookupTable<V>>
where
    V: Clone + Eq + Hash,
    I: IntoIterator<Item = (K, u32, V)>,
    K: AsRef<[u8]>,
{
    let partition = DepthPartition::new(depth_partition)?;
    TableBuilder::new(partition).k(k).build(prefixes)
}
