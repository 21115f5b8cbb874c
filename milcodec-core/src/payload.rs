//! Payload extractor (spec.md §4.3): reads the 16-bit length prefix out of
//! a synchronized bitstream, then majority-votes each payload bit across
//! three same-length blocks (triple-modular redundancy, block-interleaved
//! rather than bit-interleaved).

use crate::config::MAX_PAYLOAD_BYTES;
use crate::errors::PayloadError;
use crate::utils::{bits_to_int, pack_bits};
use crate::waveform::Bit;

const LENGTH_FIELD_BITS: usize = 16;
const REDUNDANCY: usize = 3;

/// Majority vote over one bit position read from each of the three
/// redundant blocks. An `Indeterminate` marker counts as 0.
fn majority_vote(copies: [Bit; REDUNDANCY]) -> u8 {
    let ones = copies.iter().filter(|&&b| b == Bit::One).count();
    if ones * 2 > REDUNDANCY {
        1
    } else {
        0
    }
}

/// Read and validate the 16-bit payload length field (no redundancy on
/// this field itself). Returns the decoded length and the bit offset
/// (`LENGTH_FIELD_BITS`) where the redundant payload blocks begin. The
/// length is checked against `MAX_PAYLOAD_BYTES` before any
/// length-sized allocation is made.
pub fn extract_length(bits: &[Bit]) -> Result<(u16, usize), PayloadError> {
    if bits.len() < LENGTH_FIELD_BITS {
        return Err(PayloadError::Truncated {
            required: LENGTH_FIELD_BITS,
            available: bits.len(),
        });
    }

    let length_bits: Vec<u8> = bits[..LENGTH_FIELD_BITS]
        .iter()
        .map(|b| match b {
            Bit::One => 1,
            Bit::Zero | Bit::Indeterminate => 0,
        })
        .collect();
    let length = bits_to_int(&length_bits) as u16;

    if length == 0 || length > MAX_PAYLOAD_BYTES {
        return Err(PayloadError::LengthOutOfRange {
            length,
            max: MAX_PAYLOAD_BYTES,
        });
    }

    Ok((length, LENGTH_FIELD_BITS))
}

/// Extract the full length-prefixed, triple-redundant payload, returning
/// the packed bytes.
pub fn extract_payload(bits: &[Bit]) -> Result<Vec<u8>, PayloadError> {
    let (length, header_bits) = extract_length(bits)?;

    let block_len = length as usize * 8;
    let total_needed = header_bits + block_len * REDUNDANCY;
    if bits.len() < total_needed {
        return Err(PayloadError::Truncated {
            required: total_needed,
            available: bits.len(),
        });
    }

    let block0 = &bits[header_bits..header_bits + block_len];
    let block1 = &bits[header_bits + block_len..header_bits + 2 * block_len];
    let block2 = &bits[header_bits + 2 * block_len..header_bits + 3 * block_len];

    let logical: Vec<u8> = (0..block_len)
        .map(|i| majority_vote([block0[i], block1[i], block2[i]]))
        .collect();

    Ok(pack_bits(&logical))
}
