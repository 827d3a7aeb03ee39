//! Dense blocks: a presence bitmap with rank counts, storing only the slots that differ from the
//! default of their group.
//!
//! A block is split into groups of 64 slots, and every group into 8 clusters of 8 slots. Each
//! cluster has a 16-bit codeword: the high byte is the presence bitmap (slot `j` of the cluster
//! maps to bit `7 - j`), and the low byte counts the present slots of all preceding clusters of
//! the same group. Present slots are stored in slot order. Slot `i` of a group resolves to
//! `entries[base + before + popcount(bits left of i)]` if present, and to the group default
//! otherwise.

use super::entry::{PackedEntry, MAX_ENTRY_INDEX};
use super::most_frequent;
use crate::error::{Error, Result};

pub(crate) const GROUP_SIZE: usize = 64;
pub(crate) const CLUSTER_SIZE: usize = 8;
pub(crate) const CLUSTERS_PER_GROUP: usize = GROUP_SIZE / CLUSTER_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DenseGroup {
    pub(crate) default: PackedEntry,
    /// offset of the first present slot of the group in the entry list
    pub(crate) base: u32,
}

/// A single encoded block. Group bases are relative to the block's own entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DenseBlock {
    pub(crate) groups: Vec<DenseGroup>,
    pub(crate) codewords: Vec<u16>,
    pub(crate) entries: Vec<PackedEntry>,
}

/// Encode the slots of one block. Blocks with fewer than 64 slots use a single partial group.
pub(crate) fn encode(slots: &[PackedEntry]) -> DenseBlock {
    let num_groups = (slots.len() + GROUP_SIZE - 1) / GROUP_SIZE;
    let mut block = DenseBlock {
        groups: Vec::with_capacity(num_groups),
        codewords: vec![0; num_groups * CLUSTERS_PER_GROUP],
        entries: Vec::new(),
    };
    for (g, group) in slots.chunks(GROUP_SIZE).enumerate() {
        let default = most_frequent(group);
        block.groups.push(DenseGroup {
            default,
            base: block.entries.len() as u32,
        });
        let mut before: u8 = 0;
        for (c, cluster) in group.chunks(CLUSTER_SIZE).enumerate() {
            let mut bitmap: u8 = 0;
            for (j, entry) in cluster.iter().enumerate() {
                if *entry != default {
                    bitmap |= 0x80 >> j;
                    block.entries.push(*entry);
                }
            }
            block.codewords[g * CLUSTERS_PER_GROUP + c] = ((bitmap as u16) << 8) | before as u16;
            before += bitmap.count_ones() as u8;
        }
    }
    block
}

/// All dense blocks of a table, stored back to back.
#[derive(Clone, Debug, Default)]
pub(crate) struct DenseStore {
    /// index of the first group of every block
    blocks: Vec<u32>,
    groups: Vec<DenseGroup>,
    codewords: Vec<u16>,
    entries: Vec<PackedEntry>,
}

impl DenseStore {
    /// Append a block and return its index.
    pub(crate) fn push(&mut self, block: DenseBlock) -> Result<u32> {
        let index = self.blocks.len();
        if index > MAX_ENTRY_INDEX as usize {
            return Err(Error::Capacity {
                what: "dense blocks",
                limit: MAX_ENTRY_INDEX,
            });
        }
        if self.entries.len() + block.entries.len() > u32::MAX as usize
            || self.groups.len() + block.groups.len() > u32::MAX as usize
        {
            return Err(Error::Capacity {
                what: "dense block entries",
                limit: u32::MAX,
            });
        }
        let entry_offset = self.entries.len() as u32;
        self.blocks.push(self.groups.len() as u32);
        self.groups
            .extend(block.groups.iter().map(|group| DenseGroup {
                default: group.default,
                base: group.base + entry_offset,
            }));
        self.codewords.extend_from_slice(&block.codewords);
        self.entries.extend(block.entries);
        Ok(index as u32)
    }

    /// Resolve slot `key` of block `block`.
    #[inline]
    pub(crate) fn get(&self, block: u32, key: u32) -> PackedEntry {
        let group_idx = self.blocks[block as usize] as usize + (key as usize >> 6);
        let cluster = (key as usize >> 3) & (CLUSTERS_PER_GROUP - 1);
        let codeword = self.codewords[group_idx * CLUSTERS_PER_GROUP + cluster];
        let bitmap = (codeword >> 8) as u32;
        let bit = key & 0b111;
        let group = &self.groups[group_idx];
        if bitmap & (0x80 >> bit) == 0 {
            return group.default;
        }
        let before = (codeword & 0xff) as u32;
        let left = (bitmap >> (8 - bit)).count_ones();
        self.entries[(group.base + before + left) as usize]
    }

    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }

    pub(crate) fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn memory_bytes(&self) -> usize {
        self.blocks.len() * std::mem::size_of::<u32>()
            + self.groups.len() * std::mem::size_of::<DenseGroup>()
            + self.codewords.len() * std::mem::size_of::<u16>()
            + self.entries.len() * std::mem::size_of::<PackedEntry>()
    }
}
