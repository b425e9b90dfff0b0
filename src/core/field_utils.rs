//! Byte and hex encodings of field elements.
//!
//! Base-field elements are encoded as fixed-size big-endian integers in plain
//! (non-Montgomery) form, `ceil(MODULUS_BIT_SIZE / 8)` bytes long. Extension
//! field elements are the concatenation of their base-prime-field components,
//! in the order returned by `Field::to_base_prime_field_elements`.

use super::errors::{CircuitError, CircuitResult};
use ark_ff::{Field, PrimeField};
use num_bigint::BigUint;

/// Number of bytes in the encoding of one base-field element.
pub fn field_byte_len<F: PrimeField>() -> usize {
    (F::MODULUS_BIT_SIZE as usize + 7) / 8
}

pub fn field_modulus<F: PrimeField>() -> BigUint {
    F::MODULUS.into()
}

pub fn field_to_bytes<F: PrimeField>(value: &F) -> Vec<u8> {
    let len = field_byte_len::<F>();
    let integer: BigUint = (*value).into();
    let raw = integer.to_bytes_be();
    let mut out = vec![0u8; len];
    // `raw` is never longer than `len` for a canonical element.
    out[len - raw.len()..].copy_from_slice(&raw);
    out
}

pub fn bytes_to_field<F: PrimeField>(bytes: &[u8]) -> CircuitResult<F> {
    let len = field_byte_len::<F>();
    if bytes.len() != len {
        return Err(CircuitError::Encoding(format!(
            "expected {} bytes, got {}",
            len,
            bytes.len()
        )));
    }
    let integer = BigUint::from_bytes_be(bytes);
    if integer >= field_modulus::<F>() {
        return Err(CircuitError::encoding(
            "value is not a canonical field element",
        ));
    }
    Ok(F::from(integer))
}

/// Lowercase hex of `field_to_bytes`, most-significant byte first.
pub fn field_to_hex<F: PrimeField>(value: &F, prefix: bool) -> String {
    let digits = hex::encode(field_to_bytes(value));
    if prefix {
        format!("0x{digits}")
    } else {
        digits
    }
}

/// Parses the output of [`field_to_hex`]. Accepts an optional `0x` prefix,
/// either letter case and short inputs (left-padded with zeros).
pub fn hex_to_field<F: PrimeField>(text: &str) -> CircuitResult<F> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let max_digits = 2 * field_byte_len::<F>();
    if digits.is_empty() || digits.len() > max_digits {
        return Err(CircuitError::Encoding(format!(
            "hex field element must have 1..={} digits, got {}",
            max_digits,
            digits.len()
        )));
    }
    let padded = format!("{:0>width$}", digits, width = max_digits);
    let bytes = hex::decode(&padded)
        .map_err(|err| CircuitError::Encoding(format!("invalid hex field element: {err}")))?;
    bytes_to_field(&bytes)
}

pub fn extension_field_to_bytes<E: Field>(value: &E) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        E::extension_degree() as usize * field_byte_len::<E::BasePrimeField>(),
    );
    for component in value.to_base_prime_field_elements() {
        out.extend_from_slice(&field_to_bytes(&component));
    }
    out
}

pub fn extension_field_from_bytes<E: Field>(bytes: &[u8]) -> CircuitResult<E> {
    let component_len = field_byte_len::<E::BasePrimeField>();
    let degree = E::extension_degree() as usize;
    if bytes.len() != degree * component_len {
        return Err(CircuitError::Encoding(format!(
            "expected {} bytes for a degree-{} element, got {}",
            degree * component_len,
            degree,
            bytes.len()
        )));
    }
    let components = bytes
        .chunks(component_len)
        .map(bytes_to_field::<E::BasePrimeField>)
        .collect::<CircuitResult<Vec<_>>>()?;
    E::from_base_prime_field_elems(&components)
        .ok_or_else(|| CircuitError::encoding("component count does not match extension degree"))
}
