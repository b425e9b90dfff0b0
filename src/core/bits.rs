//! Bit-vector helpers. All vectors are most-significant bit first.

use super::errors::{CircuitError, CircuitResult};

/// Expands every hex digit into four bits.
pub fn bit_vector_from_hex(hex_str: &str) -> CircuitResult<Vec<bool>> {
    let digits = hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str);
    let mut result = Vec::with_capacity(4 * digits.len());
    for c in digits.chars() {
        let nibble = c.to_digit(16).ok_or_else(|| {
            CircuitError::Encoding(format!("invalid hex digit {c:?} in bit vector"))
        })?;
        result.push(nibble & 8 != 0);
        result.push(nibble & 4 != 0);
        result.push(nibble & 2 != 0);
        result.push(nibble & 1 != 0);
    }
    Ok(result)
}

pub fn bit_vector_from_u64(value: u64) -> Vec<bool> {
    (0..64).rev().map(|i| (value >> i) & 1 == 1).collect()
}

/// Inverse of [`bit_vector_from_u64`] for vectors of at most 64 bits.
pub fn bit_vector_to_u64(bits: &[bool]) -> Option<u64> {
    if bits.len() > 64 {
        return None;
    }
    Some(bits.iter().fold(0u64, |acc, bit| (acc << 1) | *bit as u64))
}
