use crate::core::errors::CircuitResult;
use crate::snarks::gadget::Gadget;
use crate::snarks::r1cs::{ConstraintSystem, LinearCombination, Variable};
use ark_ff::PrimeField;

/// Orders a running hash and its authentication-path sibling for the next
/// Merkle level.
///
/// With `is_right = 0` the outputs are `(left, right) = (input, pathvar)`;
/// with `is_right = 1` they are swapped. The booleanity constraint on
/// `is_right` is the only range check performed on it.
#[derive(Debug, Clone)]
pub struct MerklePathSelector<F: PrimeField> {
    input: LinearCombination<F>,
    pathvar: LinearCombination<F>,
    is_right: Variable,
    left: Variable,
    right: Variable,
    annotation: String,
}

impl<F: PrimeField> MerklePathSelector<F> {
    pub fn new(
        cs: &mut ConstraintSystem<F>,
        input: LinearCombination<F>,
        pathvar: LinearCombination<F>,
        is_right: Variable,
        annotation: &str,
    ) -> Self {
        let left = cs.allocate(format!("{annotation}.left"));
        let right = cs.allocate(format!("{annotation}.right"));
        Self {
            input,
            pathvar,
            is_right,
            left,
            right,
            annotation: annotation.to_string(),
        }
    }

    pub fn left(&self) -> Variable {
        self.left
    }

    pub fn right(&self) -> Variable {
        self.right
    }
}

impl<F: PrimeField> Gadget<F> for MerklePathSelector<F> {
    fn generate_constraints(&self, cs: &mut ConstraintSystem<F>) {
        cs.enforce_boolean(self.is_right, format!("{}.is_right_boolean", self.annotation));

        // is_right * (pathvar - input) = left - input
        cs.add_constraint(
            self.is_right,
            self.pathvar.clone() - &self.input,
            LinearCombination::from(self.left) - &self.input,
            format!("{}.left_selection", self.annotation),
        );

        // is_right * (input - pathvar) = right - pathvar
        cs.add_constraint(
            self.is_right,
            self.input.clone() - &self.pathvar,
            LinearCombination::from(self.right) - &self.pathvar,
            format!("{}.right_selection", self.annotation),
        );
    }

    fn generate_witness(&self, cs: &mut ConstraintSystem<F>) -> CircuitResult<()> {
        let input = cs.eval(&self.input)?;
        let pathvar = cs.eval(&self.pathvar)?;
        let is_right = cs.value(self.is_right)?;

        cs.set_value(self.left, input + is_right * (pathvar - input))?;
        cs.set_value(self.right, pathvar + is_right * (input - pathvar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_ff::{One, Zero};

    fn selector_circuit(
        input: Fr,
        pathvar: Fr,
        is_right: Fr,
    ) -> (ConstraintSystem<Fr>, MerklePathSelector<Fr>) {
        let mut cs = ConstraintSystem::<Fr>::new();
        let input_var = cs.allocate("input");
        let path_var = cs.allocate("pathvar");
        let bit = cs.allocate("is_right");
        let selector =
            MerklePathSelector::new(&mut cs, input_var.into(), path_var.into(), bit, "selector");
        selector.generate_constraints(&mut cs);

        cs.set_value(input_var, input).unwrap();
        cs.set_value(path_var, pathvar).unwrap();
        cs.set_value(bit, is_right).unwrap();
        selector.generate_witness(&mut cs).unwrap();
        (cs, selector)
    }

    #[test]
    fn left_child_keeps_order() {
        let (cs, selector) = selector_circuit(Fr::from(12u64), Fr::from(34u64), Fr::zero());
        assert!(cs.is_satisfied());
        assert_eq!(cs.value(selector.left()).unwrap(), Fr::from(12u64));
        assert_eq!(cs.value(selector.right()).unwrap(), Fr::from(34u64));
    }

    #[test]
    fn right_child_swaps_order() {
        let (cs, selector) = selector_circuit(Fr::from(12u64), Fr::from(34u64), Fr::one());
        assert!(cs.is_satisfied());
        assert_eq!(cs.value(selector.left()).unwrap(), Fr::from(34u64));
        assert_eq!(cs.value(selector.right()).unwrap(), Fr::from(12u64));
    }

    #[test]
    fn non_boolean_selector_is_unsatisfiable() {
        let (cs, _) = selector_circuit(Fr::from(12u64), Fr::from(34u64), Fr::from(2u64));
        assert!(!cs.is_satisfied());
        let z = cs.full_assignment().unwrap();
        assert_eq!(cs.first_unsatisfied(&z), Some(0));
        // The selection constraints alone still hold for the arithmetic witness.
        assert_eq!(
            cs.constraints()
                .iter()
                .filter(|c| c.is_satisfied_by(&z, cs.num_primary()))
                .count(),
            2
        );
    }

    #[test]
    fn emits_three_constraints() {
        let (cs, _) = selector_circuit(Fr::one(), Fr::one(), Fr::zero());
        assert_eq!(cs.num_constraints(), 3);
        assert_eq!(cs.num_variables(), 5);
    }

    #[test]
    fn forged_order_is_rejected() {
        let (mut cs, selector) = selector_circuit(Fr::from(5u64), Fr::from(9u64), Fr::zero());
        cs.set_value(selector.left(), Fr::from(9u64)).unwrap();
        cs.set_value(selector.right(), Fr::from(5u64)).unwrap();
        assert!(!cs.is_satisfied());
    }
}
