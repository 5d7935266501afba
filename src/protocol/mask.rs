//! XOR payload masking (RFC 6455 Section 5.3).
//!
//! Every client-to-server frame carries a 4-byte masking key; the payload is
//! XOR-ed with the key repeated. Unmasking is the same operation.

/// Apply (or remove) a mask in place.
///
/// Processes four bytes at a time as native-endian `u32` words, then the tail
/// byte-by-byte.
#[inline]
pub fn apply_mask(data: &mut [u8], mask: [u8; 4]) {
    let mask_word = u32::from_ne_bytes(mask);
    let mut chunks = data.chunks_exact_mut(4);
    for chunk in &mut chunks {
        let word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) ^ mask_word;
        chunk.copy_from_slice(&word.to_ne_bytes());
    }
    for (i, byte) in chunks.into_remainder().iter_mut().enumerate() {
        *byte ^= mask[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_known_vector() {
        // "Hello" masked with [0x37, 0xfa, 0x21, 0x3d] per RFC 6455 examples.
        let mut data = b"Hello".to_vec();
        apply_mask(&mut data, [0x37, 0xfa, 0x21, 0x3d]);
        assert_eq!(data, [0x7f, 0x9f, 0x4d, 0x51, 0x58]);
    }

    #[test]
    fn test_mask_is_involution() {
        let original: Vec<u8> = (0..=255).collect();
        let mask = [0xde, 0xad, 0xbe, 0xef];
        let mut data = original.clone();
        apply_mask(&mut data, mask);
        assert_ne!(data, original);
        apply_mask(&mut data, mask);
        assert_eq!(data, original);
    }

    #[test]
    fn test_mask_empty() {
        let mut data: Vec<u8> = Vec::new();
        apply_mask(&mut data, [1, 2, 3, 4]);
        assert!(data.is_empty());
    }

    #[test]
    fn test_mask_unaligned_tail() {
        for len in [1usize, 2, 3, 5, 6, 7] {
            let original = vec![0xAAu8; len];
            let mask = [0x01, 0x02, 0x03, 0x04];
            let mut data = original.clone();
            apply_mask(&mut data, mask);
            for (i, byte) in data.iter().enumerate() {
                assert_eq!(*byte, 0xAA ^ mask[i % 4]);
            }
        }
    }
}
