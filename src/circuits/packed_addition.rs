//! Packing of bit vectors into field values and the value-conservation check.
//!
//! Values are unsigned integers carried as most-significant-bit-first bit
//! vectors. The conservation gadget emits a single linear equality between
//! the packed sums of both sides; it does not range-check the bits.

use crate::core::errors::{CircuitError, CircuitResult};
use crate::snarks::gadget::Gadget;
use crate::snarks::r1cs::{ConstraintSystem, LinearCombination, Variable};
use ark_ff::PrimeField;
use tracing::debug;

use super::bit_array::BitArray;

/// Width of a note or public value in bits.
pub const VALUE_BITS: usize = 64;

/// `Σ b_i * 2^(k-1-i)` over `bits = [b_0..b_{k-1}]`.
pub fn packed_addition<F: PrimeField>(bits: &[Variable]) -> LinearCombination<F> {
    let mut lc = LinearCombination::zero();
    let mut coeff = F::one();
    for bit in bits.iter().rev() {
        lc.add_term(*bit, coeff);
        coeff.double_in_place();
    }
    lc
}

/// Proves `Σ left = Σ right` as integers.
///
/// The sum of every operand must stay below the modulus, otherwise the
/// equality holds modulo `p` and value can be created. The constructor rejects
/// operand counts and widths that could wrap.
#[derive(Debug, Clone)]
pub struct PackedValueConservationGadget {
    left: Vec<BitArray>,
    right: Vec<BitArray>,
    annotation: String,
}

impl PackedValueConservationGadget {
    pub fn new<F: PrimeField>(
        left: Vec<BitArray>,
        right: Vec<BitArray>,
        annotation: &str,
    ) -> CircuitResult<Self> {
        if left.is_empty() && right.is_empty() {
            return Err(CircuitError::invalid_parameters(
                "value conservation needs at least one operand",
            ));
        }
        let max_width = left.iter().chain(&right).map(BitArray::len).max().unwrap_or(0);
        let carry_bits = ceil_log2(left.len().max(right.len()));
        let budget = F::MODULUS_BIT_SIZE as usize - 1;
        if max_width + carry_bits >= budget {
            return Err(CircuitError::InvalidParameters(format!(
                "{} + {} operands of {} bits may wrap a {}-bit modulus",
                left.len(),
                right.len(),
                max_width,
                F::MODULUS_BIT_SIZE
            )));
        }
        debug!(
            "[packed] {}: {} left / {} right operands, width {}",
            annotation,
            left.len(),
            right.len(),
            max_width
        );
        Ok(Self {
            left,
            right,
            annotation: annotation.to_string(),
        })
    }

    pub fn left(&self) -> &[BitArray] {
        &self.left
    }

    pub fn right(&self) -> &[BitArray] {
        &self.right
    }

    pub fn left_sum<F: PrimeField>(&self) -> LinearCombination<F> {
        sum_packed(&self.left)
    }

    pub fn right_sum<F: PrimeField>(&self) -> LinearCombination<F> {
        sum_packed(&self.right)
    }

    pub fn left_value<F: PrimeField>(&self, cs: &ConstraintSystem<F>) -> CircuitResult<F> {
        cs.eval(&self.left_sum())
    }

    pub fn right_value<F: PrimeField>(&self, cs: &ConstraintSystem<F>) -> CircuitResult<F> {
        cs.eval(&self.right_sum())
    }
}

impl<F: PrimeField> Gadget<F> for PackedValueConservationGadget {
    fn generate_constraints(&self, cs: &mut ConstraintSystem<F>) {
        cs.enforce_equal(
            self.left_sum::<F>(),
            self.right_sum::<F>(),
            format!("{}.equality", self.annotation),
        );
    }

    /// The operand bits are owned by the caller; nothing to assign here.
    fn generate_witness(&self, _cs: &mut ConstraintSystem<F>) -> CircuitResult<()> {
        Ok(())
    }
}

fn sum_packed<F: PrimeField>(operands: &[BitArray]) -> LinearCombination<F> {
    operands
        .iter()
        .fold(LinearCombination::zero(), |acc, operand| acc + operand.packed())
}

fn ceil_log2(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}
