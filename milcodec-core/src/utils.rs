//! Bitstream packing helpers shared by the payload extractor and fixtures.

/// Expand a byte slice into an MSB-first bitstream.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |bit| (byte >> bit) & 1))
        .collect()
}

/// Pack a bitstream (MSB-first, length a multiple of 8) into bytes.
pub fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1)))
        .collect()
}

/// Encode an unsigned integer as an MSB-first bitstream of the given width.
pub fn int_to_bits(value: u64, bits: usize) -> Vec<u8> {
    (0..bits).rev().map(|bit| ((value >> bit) & 1) as u8).collect()
}

/// Decode an MSB-first bitstream into an unsigned integer.
pub fn bits_to_int(bits: &[u8]) -> u64 {
    bits.iter().fold(0u64, |acc, &b| (acc << 1) | (b & 1) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_bit_roundtrip() {
        let bytes = b"Mc";
        let bits = bytes_to_bits(bytes);
        assert_eq!(bits.len(), bytes.len() * 8);
        assert_eq!(pack_bits(&bits), bytes);
    }

    #[test]
    fn int_bit_roundtrip() {
        let bits = int_to_bits(0xACE, 16);
        assert_eq!(bits.len(), 16);
        assert_eq!(bits_to_int(&bits), 0xACE);
    }

    #[test]
    fn int_to_bits_msb_first() {
        let bits = int_to_bits(0b101, 3);
        assert_eq!(bits, vec![1, 0, 1]);
    }
}
