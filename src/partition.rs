//! Depth partitions: how the address bits are split into the levels of a forwarding table.

use crate::error::{Error, Result};
use crate::trie::MAX_PREFIX_LEN;

/// Maximal depth of the root level, in bits. The root is a flat array of `2^depth` entries, so
/// this bounds it to 16M entries.
pub const MAX_ROOT_DEPTH: u32 = 24;
/// Maximal depth of every level below the root, in bits. Sparse blocks store the prefix and mask
/// of every entry in 16 bits.
pub const MAX_LEVEL_DEPTH: u32 = 16;

/// Validated split of the address bits into levels. The first level is indexed directly, every
/// following level is compressed into dense or sparse blocks. The sum of all depths is the address
/// width.
///
/// ```
/// # use fib_compress::*;
/// assert_eq!(DepthPartition::ipv4().depths(), &[16, 8, 8]);
/// assert_eq!(DepthPartition::ipv6().width(), 128);
/// assert!(DepthPartition::with_width(&[16, 8, 4], 32).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<u32>", into = "Vec<u32>")
)]
pub struct DepthPartition {
    depths: Vec<u8>,
}

impl DepthPartition {
    /// Validate a partition. The root depth must be within `1..=24`, all other depths within
    /// `1..=16`, and the total may not exceed 128 bits.
    ///
    /// The root level is stored as a flat array of `2^depth` entries, which caps it at
    /// [`MAX_ROOT_DEPTH`]. Every deeper level may become a sparse block, whose entries keep their
    /// prefix and mask as `u16`, which caps it at [`MAX_LEVEL_DEPTH`]. A partition like `[8, 24]`
    /// is rejected even though it covers 32 bits; split the wide level instead.
    ///
    /// ```
    /// # use fib_compress::*;
    /// assert!(DepthPartition::new(&[8, 24]).is_err());
    /// assert!(DepthPartition::new(&[8, 12, 12]).is_ok());
    /// ```
    pub fn new(depths: &[u32]) -> Result<Self> {
        if depths.is_empty() {
            return Err(Error::EmptyPartition);
        }
        for (level, &depth) in depths.iter().enumerate() {
            let max = if level == 0 {
                MAX_ROOT_DEPTH
            } else {
                MAX_LEVEL_DEPTH
            };
            if depth == 0 || depth > max {
                return Err(Error::LevelDepth { level, depth, max });
            }
        }
        let sum: u32 = depths.iter().sum();
        if sum > MAX_PREFIX_LEN {
            return Err(Error::PartitionWidth {
                sum,
                width: MAX_PREFIX_LEN,
            });
        }
        Ok(Self {
            depths: depths.iter().map(|d| *d as u8).collect(),
        })
    }

    /// Validate a partition that must cover exactly `width` bits.
    pub fn with_width(depths: &[u32], width: u32) -> Result<Self> {
        let partition = Self::new(depths)?;
        if partition.width() != width {
            return Err(Error::PartitionWidth {
                sum: partition.width(),
                width,
            });
        }
        Ok(partition)
    }

    /// `16, 8, 8`: a 64k root array followed by two octet levels.
    pub fn ipv4() -> Self {
        Self {
            depths: vec![16, 8, 8],
        }
    }

    /// `16` followed by fourteen octet levels.
    pub fn ipv6() -> Self {
        let mut depths = vec![16];
        depths.extend(std::iter::repeat(8).take(14));
        Self { depths }
    }

    /// Depth of every level, root first.
    pub fn depths(&self) -> &[u8] {
        &self.depths
    }

    /// Depth of the root level.
    pub fn root_depth(&self) -> u8 {
        self.depths[0]
    }

    /// Number of levels.
    pub fn levels(&self) -> usize {
        self.depths.len()
    }

    /// Address width covered by the partition.
    pub fn width(&self) -> u32 {
        self.depths.iter().map(|d| *d as u32).sum()
    }
}

impl TryFrom<Vec<u32>> for DepthPartition {
    type Error = Error;

    fn try_from(depths: Vec<u32>) -> Result<Self> {
        Self::new(&depths)
    }
}

impl TryFrom<&[u32]> for DepthPartition {
    type Error = Error;

    fn try_from(depths: &[u32]) -> Result<Self> {
        Self::new(depths)
    }
}

impl From<DepthPartition> for Vec<u32> {
    fn from(partition: DepthPartition) -> Self {
        partition.depths.into_iter().map(u32::from).collect()
    }
}
