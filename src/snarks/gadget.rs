use super::r1cs::ConstraintSystem;
use crate::core::errors::CircuitResult;
use ark_ff::PrimeField;

/// A composable circuit fragment.
///
/// Gadgets allocate their internal variables when constructed and only borrow
/// the input/output variables handed to them. Afterwards the caller runs the
/// two phases in dependency order:
///
/// 1. `generate_constraints` once, emitting the static circuit. Calling it
///    twice duplicates constraints.
/// 2. `generate_witness` once per execution, after every input variable of
///    the gadget has a value. It fills in the gadget's internal and output
///    variables.
pub trait Gadget<F: PrimeField> {
    fn generate_constraints(&self, cs: &mut ConstraintSystem<F>);

    fn generate_witness(&self, cs: &mut ConstraintSystem<F>) -> CircuitResult<()>;
}

impl<F: PrimeField, G: Gadget<F> + ?Sized> Gadget<F> for Box<G> {
    fn generate_constraints(&self, cs: &mut ConstraintSystem<F>) {
        (**self).generate_constraints(cs)
    }

    fn generate_witness(&self, cs: &mut ConstraintSystem<F>) -> CircuitResult<()> {
        (**self).generate_witness(cs)
    }
}

/// Runs each member in sequence order, which must be a topological order.
impl<F: PrimeField, G: Gadget<F>> Gadget<F> for Vec<G> {
    fn generate_constraints(&self, cs: &mut ConstraintSystem<F>) {
        for gadget in self {
            gadget.generate_constraints(cs);
        }
    }

    fn generate_witness(&self, cs: &mut ConstraintSystem<F>) -> CircuitResult<()> {
        for gadget in self {
            gadget.generate_witness(cs)?;
        }
        Ok(())
    }
}
