//! Bit access on big-endian byte keys. Bit `0` is the most significant bit of the first byte.

/// Check if bit `bit` of `bytes` is set. The caller guarantees `bit < bytes.len() * 8`.
#[inline(always)]
pub(crate) fn bit_at(bytes: &[u8], bit: usize) -> bool {
    (bytes[bit / 8] >> (7 - bit % 8)) & 1 == 1
}

/// Read `count` bits (at most 32) starting at bit `offset`, returned right-aligned. Returns `None`
/// if `bytes` is too short.
#[inline]
pub(crate) fn extract_bits(bytes: &[u8], offset: usize, count: u8) -> Option<u32> {
    let end = offset + count as usize;
    if end > bytes.len() * 8 {
        return None;
    }
    // fast path for byte-aligned octets
    if count == 8 && offset % 8 == 0 {
        return Some(bytes[offset / 8] as u32);
    }
    let mut result: u32 = 0;
    let mut pos = offset;
    while pos < end {
        let available = 8 - pos % 8;
        let take = available.min(end - pos);
        let chunk = (bytes[pos / 8] as u32 >> (available - take)) & ((1u32 << take) - 1);
        result = (result << take) | chunk;
        pos += take;
    }
    Some(result)
}
