//! Description of the generic type `Prefix`, and of the prefix keys produced by the trie.

#[cfg(feature = "ipnet")]
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use num_traits::{ops::bytes::ToBytes, PrimInt, Unsigned, Zero};

/// Maximal number of bytes in a prefix key (an IPv6 address).
pub const MAX_KEY_BYTES: usize = 16;

/// Trait for anything that can be inserted into a [`crate::BinaryTrie`] as a prefix.
pub trait Prefix {
    /// The prefix key as big-endian bytes. Bits beyond the prefix length are ignored.
    fn key(&self) -> KeyBytes;

    /// Prefix length in bits.
    fn prefix_len(&self) -> u8;
}

/// A big-endian key of up to 16 bytes, stored inline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyBytes {
    bytes: [u8; MAX_KEY_BYTES],
    len: u8,
}

impl KeyBytes {
    /// Copy a key from a slice. Bytes beyond the first 16 are dropped.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let len = bytes.len().min(MAX_KEY_BYTES);
        let mut buf = [0; MAX_KEY_BYTES];
        buf[..len].copy_from_slice(&bytes[..len]);
        Self {
            bytes: buf,
            len: len as u8,
        }
    }
}

impl AsRef<[u8]> for KeyBytes {
    fn as_ref(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

impl<const N: usize> From<[u8; N]> for KeyBytes {
    fn from(bytes: [u8; N]) -> Self {
        Self::from_slice(&bytes)
    }
}

/// A prefix of up to 128 bits as it is stored in the trie. The bits are left-aligned: bit `0` of
/// the prefix is the most significant bit of `bits`. All bits beyond `len` are zero.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitPrefix {
    bits: u128,
    len: u8,
}

impl BitPrefix {
    /// Create a new prefix. `len` is clamped to 128, and all bits beyond `len` are cleared.
    pub fn new(bits: u128, len: u8) -> Self {
        let len = len.min(128);
        Self {
            bits: bits & mask_from_prefix_len::<u128>(len),
            len,
        }
    }

    /// The prefix matching everything.
    pub fn root() -> Self {
        Self::default()
    }

    /// Left-aligned bits of the prefix.
    pub fn bits(&self) -> u128 {
        self.bits
    }

    /// Prefix length.
    pub fn len(&self) -> u8 {
        self.len
    }

    /// Check whether this is the zero-length prefix.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The prefix bits right-aligned within a `width`-bit key. `width` must be at most 128.
    pub fn right_aligned(&self, width: u8) -> u128 {
        if width == 0 {
            0
        } else {
            self.bits >> (128 - width as u32)
        }
    }

    /// Check if `self` contains `other`. A prefix contains itself.
    pub fn contains(&self, other: &Self) -> bool {
        self.len <= other.len && other.bits & mask_from_prefix_len::<u128>(self.len) == self.bits
    }

    /// Extend the prefix by a single bit.
    pub(crate) fn child(&self, right: bool) -> Self {
        let bits = if right {
            self.bits | (1u128 << (127 - self.len as u32))
        } else {
            self.bits
        };
        Self {
            bits,
            len: self.len + 1,
        }
    }
}

impl Prefix for BitPrefix {
    fn key(&self) -> KeyBytes {
        let bytes = (self.len as usize + 7) / 8;
        KeyBytes::from_slice(&self.bits.to_be_bytes()[..bytes])
    }

    fn prefix_len(&self) -> u8 {
        self.len
    }
}

pub(crate) fn mask_from_prefix_len<R>(len: u8) -> R
where
    R: PrimInt + Zero,
{
    if len as u32 >= R::zero().count_zeros() {
        !R::zero()
    } else if len == 0 {
        R::zero()
    } else {
        !((!R::zero()) >> len as usize)
    }
}

#[cfg(feature = "ipnet")]
impl Prefix for Ipv4Net {
    fn key(&self) -> KeyBytes {
        self.network().octets().into()
    }

    fn prefix_len(&self) -> u8 {
        self.prefix_len()
    }
}

#[cfg(feature = "ipnet")]
impl Prefix for Ipv6Net {
    fn key(&self) -> KeyBytes {
        self.network().octets().into()
    }

    fn prefix_len(&self) -> u8 {
        self.prefix_len()
    }
}

#[cfg(feature = "ipnet")]
impl Prefix for IpNet {
    fn key(&self) -> KeyBytes {
        match self {
            IpNet::V4(net) => Prefix::key(net),
            IpNet::V6(net) => Prefix::key(net),
        }
    }

    fn prefix_len(&self) -> u8 {
        self.prefix_len()
    }
}

impl<R> Prefix for (R, u8)
where
    R: Unsigned + PrimInt + ToBytes,
{
    fn key(&self) -> KeyBytes {
        let masked = self.0 & mask_from_prefix_len::<R>(self.1);
        KeyBytes::from_slice(masked.to_be_bytes().as_ref())
    }

    fn prefix_len(&self) -> u8 {
        self.1
    }
}
