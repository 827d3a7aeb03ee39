//! Errors raised while inserting prefixes or compiling a lookup table.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every error is raised synchronously by the call that violates its contract. All variants
/// describe an invalid argument; lookups never fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The prefix length is larger than the number of bits in the prefix key.
    #[error("prefix length {prefix_len} exceeds the {key_bits} bits of the prefix key")]
    PrefixLength {
        /// requested prefix length
        prefix_len: u32,
        /// number of bits available in the key
        key_bits: u32,
    },
    /// The prefix length is larger than the supported address width.
    #[error("prefix length {prefix_len} exceeds the maximum of {max} bits")]
    PrefixTooLong {
        /// requested prefix length
        prefix_len: u32,
        /// maximum prefix length
        max: u32,
    },
    /// A depth partition without any level.
    #[error("depth partition must contain at least one level")]
    EmptyPartition,
    /// A single level of a depth partition is out of range.
    #[error("depth {depth} of level {level} is out of range 1..={max}")]
    LevelDepth {
        /// level within the partition
        level: usize,
        /// requested depth
        depth: u32,
        /// maximum depth for that level
        max: u32,
    },
    /// The depths of a partition do not add up to the address width.
    #[error("depth partition covers {sum} bits, but the address width is {width} bits")]
    PartitionWidth {
        /// sum of all depths
        sum: u32,
        /// expected address width
        width: u32,
    },
    /// A key passed to the table builder is not exactly as wide as the partition.
    #[error("key of {key_bits} bits does not match the {width} bit depth partition")]
    KeyWidth {
        /// number of bits in the key
        key_bits: u32,
        /// width covered by the partition
        width: u32,
    },
    /// A forwarding array does not have the shape the partition describes.
    #[error("forwarding array at level {level} has depth {found}, expected {expected}")]
    ArrayShape {
        /// level of the offending array
        level: usize,
        /// depth required by the partition (`0` if the partition has no such level)
        expected: u8,
        /// depth of the array
        found: u8,
    },
    /// The 30-bit index space of a lookup entry is exhausted.
    #[error("too many {what}: the limit is {limit}")]
    Capacity {
        /// what overflowed (results, dense blocks, sparse blocks)
        what: &'static str,
        /// maximal number of elements
        limit: u32,
    },
}
