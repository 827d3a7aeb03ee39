//! Lookup entries: references to a result, a dense block, or a sparse block.

/// Largest index a lookup entry can hold (30 bits).
pub const MAX_ENTRY_INDEX: u32 = (1 << 30) - 1;

const TAG_SHIFT: u32 = 30;
const TAG_LEAF: u32 = 0;
const TAG_DENSE: u32 = 1;
const TAG_SPARSE: u32 = 2;

/// What a slot of the compressed table resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupEntry {
    /// Index into the result list. Index `0` means "no match".
    Leaf(u32),
    /// Index of a dense block for the next level.
    Dense(u32),
    /// Index of a sparse block for the next level.
    Sparse(u32),
}

impl LookupEntry {
    /// The entry that resolves to no value.
    pub const NO_MATCH: Self = LookupEntry::Leaf(0);
}

/// A [`LookupEntry`] packed into 32 bits: a 2-bit tag followed by a 30-bit index. Leaf `0` packs
/// to `0`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub(crate) struct PackedEntry(u32);

impl PackedEntry {
    pub(crate) const NO_MATCH: Self = PackedEntry(0);

    /// Pack an entry. The caller guarantees that the index fits into 30 bits.
    #[inline(always)]
    pub(crate) fn pack(entry: LookupEntry) -> Self {
        let (tag, index) = match entry {
            LookupEntry::Leaf(i) => (TAG_LEAF, i),
            LookupEntry::Dense(i) => (TAG_DENSE, i),
            LookupEntry::Sparse(i) => (TAG_SPARSE, i),
        };
        debug_assert!(index <= MAX_ENTRY_INDEX);
        PackedEntry((tag << TAG_SHIFT) | (index & MAX_ENTRY_INDEX))
    }

    #[inline(always)]
    pub(crate) fn unpack(self) -> LookupEntry {
        let index = self.0 & MAX_ENTRY_INDEX;
        match self.0 >> TAG_SHIFT {
            TAG_DENSE => LookupEntry::Dense(index),
            TAG_SPARSE => LookupEntry::Sparse(index),
            _ => LookupEntry::Leaf(index),
        }
    }

    /// Check whether the entry points to a block of the next level.
    #[inline(always)]
    pub(crate) fn is_block(self) -> bool {
        self.0 >> TAG_SHIFT != TAG_LEAF
    }
}

impl From<LookupEntry> for PackedEntry {
    fn from(entry: LookupEntry) -> Self {
        Self::pack(entry)
    }
}

impl From<PackedEntry> for LookupEntry {
    fn from(packed: PackedEntry) -> Self {
        packed.unpack()
    }
}

impl std::fmt::Debug for PackedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.unpack(), f)
    }
}
