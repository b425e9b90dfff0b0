use crate::core::errors::{CircuitError, CircuitResult};
use crate::snarks::r1cs::{ConstraintSystem, LinearCombination, Variable};
use ark_ff::PrimeField;

use super::packed_addition::packed_addition;

/// A run of witness variables read most-significant bit first.
///
/// Allocation does not constrain the slots; call
/// [`BitArray::enforce_boolean`] once if nothing else range-checks them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitArray {
    bits: Vec<Variable>,
}

impl BitArray {
    pub fn allocate<F: PrimeField>(
        cs: &mut ConstraintSystem<F>,
        width: usize,
        annotation: &str,
    ) -> Self {
        let bits = (0..width)
            .map(|i| cs.allocate(format!("{annotation}[{i}]")))
            .collect();
        Self { bits }
    }

    pub fn bits(&self) -> &[Variable] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn enforce_boolean<F: PrimeField>(&self, cs: &mut ConstraintSystem<F>, annotation: &str) {
        for (i, bit) in self.bits.iter().enumerate() {
            cs.enforce_boolean(*bit, format!("{annotation}[{i}] boolean"));
        }
    }

    pub fn fill_with_bits<F: PrimeField>(
        &self,
        cs: &mut ConstraintSystem<F>,
        values: &[bool],
    ) -> CircuitResult<()> {
        if values.len() != self.bits.len() {
            return Err(CircuitError::InvalidParameters(format!(
                "expected {} bits, got {}",
                self.bits.len(),
                values.len()
            )));
        }
        for (var, bit) in self.bits.iter().zip(values) {
            cs.set_value(*var, if *bit { F::one() } else { F::zero() })?;
        }
        Ok(())
    }

    /// Writes the low `len()` bits of `value`, most significant first.
    pub fn fill_with_u64<F: PrimeField>(
        &self,
        cs: &mut ConstraintSystem<F>,
        value: u64,
    ) -> CircuitResult<()> {
        let width = self.bits.len();
        if width < 64 && value >> width != 0 {
            return Err(CircuitError::InvalidParameters(format!(
                "value {value} does not fit in {width} bits"
            )));
        }
        let values: Vec<bool> = (0..width)
            .map(|i| {
                let shift = width - 1 - i;
                shift < 64 && (value >> shift) & 1 == 1
            })
            .collect();
        self.fill_with_bits(cs, &values)
    }

    pub fn packed<F: PrimeField>(&self) -> LinearCombination<F> {
        packed_addition(&self.bits)
    }

    pub fn value<F: PrimeField>(&self, cs: &ConstraintSystem<F>) -> CircuitResult<F> {
        cs.eval(&self.packed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn fill_and_pack_u64() {
        let mut cs = ConstraintSystem::<Fr>::new();
        let bits = BitArray::allocate(&mut cs, 8, "byte");
        bits.enforce_boolean(&mut cs, "byte");
        bits.fill_with_u64(&mut cs, 0xA5).unwrap();

        assert_eq!(bits.len(), 8);
        assert_eq!(bits.value(&cs).unwrap(), Fr::from(0xA5u64));
        assert_eq!(cs.value(bits.bits()[0]).unwrap(), Fr::from(1u64));
        assert_eq!(cs.value(bits.bits()[1]).unwrap(), Fr::from(0u64));
        assert!(cs.is_satisfied());
    }

    #[test]
    fn wide_arrays_zero_extend() {
        let mut cs = ConstraintSystem::<Fr>::new();
        let bits = BitArray::allocate(&mut cs, 70, "wide");
        bits.fill_with_u64(&mut cs, u64::MAX).unwrap();
        assert_eq!(bits.value(&cs).unwrap(), Fr::from(u64::MAX));
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let mut cs = ConstraintSystem::<Fr>::new();
        let bits = BitArray::allocate(&mut cs, 4, "nibble");
        assert!(bits.fill_with_u64(&mut cs, 16).is_err());
        assert!(bits.fill_with_bits(&mut cs, &[true, false]).is_err());
        assert!(bits.value(&cs).is_err());
    }

    #[test]
    fn non_boolean_slot_breaks_range_check() {
        let mut cs = ConstraintSystem::<Fr>::new();
        let bits = BitArray::allocate(&mut cs, 2, "pair");
        bits.enforce_boolean(&mut cs, "pair");
        bits.fill_with_u64(&mut cs, 2).unwrap();
        assert!(cs.is_satisfied());
        cs.set_value(bits.bits()[1], Fr::from(3u64)).unwrap();
        assert!(!cs.is_satisfied());
    }
}
