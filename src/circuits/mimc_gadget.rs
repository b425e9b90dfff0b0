//! MiMC permutation and compression gadgets.
//!
//! Each round certifies `y = (input + key + c)^E` with one multiplication
//! constraint per step of the exponent chain (three for `E = 5`). The round
//! input `x = input + key + c` stays a linear combination and is never
//! allocated. The final round folds `key + extra` into the output of its last
//! multiplication: `acc * x = result - key - extra`.

use super::mimc::{
    check_round_count, exponent_chain, round_constants, validate_exponent, ChainStep,
    MimcParameters,
};
use crate::core::errors::CircuitResult;
use crate::snarks::gadget::Gadget;
use crate::snarks::r1cs::{ConstraintSystem, ConstraintTracker, LinearCombination, Variable};
use ark_ff::PrimeField;
use std::marker::PhantomData;

/// One round of the permutation.
#[derive(Debug, Clone)]
pub struct MimcRoundGadget<F: PrimeField> {
    input: LinearCombination<F>,
    key: LinearCombination<F>,
    constant: F,
    chain: Vec<ChainStep>,
    /// Outputs of every chain step but the last.
    intermediates: Vec<Variable>,
    output: Variable,
    /// `key + extra` on the final round.
    finalization: Option<LinearCombination<F>>,
    annotation: String,
}

impl<F: PrimeField> MimcRoundGadget<F> {
    /// Certifies `output = (input + key + constant)^exponent`, minus
    /// `finalization` when present.
    ///
    /// The exponent goes through [`validate_exponent`] before anything is
    /// allocated, so a round always carries at least two multiplications.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cs: &mut ConstraintSystem<F>,
        input: LinearCombination<F>,
        key: LinearCombination<F>,
        constant: F,
        exponent: u64,
        output: Variable,
        finalization: Option<LinearCombination<F>>,
        annotation: &str,
    ) -> CircuitResult<Self> {
        validate_exponent::<F>(exponent)?;
        let chain = exponent_chain(exponent);
        let intermediates = (0..chain.len() - 1)
            .map(|step| cs.allocate(format!("{annotation}.t{step}")))
            .collect();
        Ok(Self {
            input,
            key,
            constant,
            chain,
            intermediates,
            output,
            finalization,
            annotation: annotation.to_string(),
        })
    }

    pub fn output(&self) -> Variable {
        self.output
    }

    fn base(&self) -> LinearCombination<F> {
        self.input.clone() + &self.key + LinearCombination::constant(self.constant)
    }

    fn target(&self, step: usize) -> LinearCombination<F> {
        match self.intermediates.get(step) {
            Some(var) => LinearCombination::from(*var),
            None => match &self.finalization {
                Some(added) => LinearCombination::from(self.output) - added,
                None => LinearCombination::from(self.output),
            },
        }
    }
}

impl<F: PrimeField> Gadget<F> for MimcRoundGadget<F> {
    fn generate_constraints(&self, cs: &mut ConstraintSystem<F>) {
        let base = self.base();
        let mut acc = base.clone();
        for (step, op) in self.chain.iter().enumerate() {
            let other = match op {
                ChainStep::Square => acc.clone(),
                ChainStep::MultiplyBase => base.clone(),
            };
            let target = self.target(step);
            cs.add_constraint(
                acc,
                other,
                target,
                format!("{}.step{}", self.annotation, step),
            );
            acc = match self.intermediates.get(step) {
                Some(var) => LinearCombination::from(*var),
                None => LinearCombination::zero(),
            };
        }
    }

    fn generate_witness(&self, cs: &mut ConstraintSystem<F>) -> CircuitResult<()> {
        let base = cs.eval(&self.base())?;
        let mut acc = base;
        for (step, op) in self.chain.iter().enumerate() {
            acc = op.apply(acc, base);
            if let Some(var) = self.intermediates.get(step) {
                cs.set_value(*var, acc)?;
            }
        }
        let output = match &self.finalization {
            Some(added) => acc + cs.eval(added)?,
            None => acc,
        };
        tracing::trace!("[mimc] {} = {}", self.annotation, output);
        cs.set_value(self.output, output)
    }
}

/// Keyed permutation producing `E_key(msg) + key + extra` in `result`.
#[derive(Debug, Clone)]
pub struct MimcPermutationGadget<P: MimcParameters> {
    rounds: Vec<MimcRoundGadget<P::Field>>,
    result: Variable,
    _params: PhantomData<P>,
}

impl<P: MimcParameters> MimcPermutationGadget<P> {
    /// Permutation with the full `P::ROUNDS` rounds.
    pub fn new(
        cs: &mut ConstraintSystem<P::Field>,
        msg: LinearCombination<P::Field>,
        key: LinearCombination<P::Field>,
        extra: Option<LinearCombination<P::Field>>,
        result: Variable,
        annotation: &str,
    ) -> CircuitResult<Self> {
        Self::new_with_rounds(cs, msg, key, extra, result, P::ROUNDS, annotation)
    }

    /// Fails before allocating anything if `rounds < 2`, the exponent is not a
    /// permutation exponent for the field, or the constants table is too short.
    pub fn new_with_rounds(
        cs: &mut ConstraintSystem<P::Field>,
        msg: LinearCombination<P::Field>,
        key: LinearCombination<P::Field>,
        extra: Option<LinearCombination<P::Field>>,
        result: Variable,
        rounds: usize,
        annotation: &str,
    ) -> CircuitResult<Self> {
        check_round_count::<P>(rounds)?;
        validate_exponent::<P::Field>(P::EXPONENT)?;
        let constants = round_constants::<P>();
        let mut tracker = ConstraintTracker::new(cs);

        let finalization = match extra {
            Some(extra) => key.clone() + &extra,
            None => key.clone(),
        };

        let mut round_gadgets: Vec<MimcRoundGadget<P::Field>> = Vec::with_capacity(rounds);
        for (i, constant) in constants.iter().take(rounds).enumerate() {
            let input = match round_gadgets.last() {
                Some(previous) => LinearCombination::from(previous.output()),
                None => msg.clone(),
            };
            let is_last = i == rounds - 1;
            let output = if is_last {
                result
            } else {
                cs.allocate(format!("{annotation}.round{i}"))
            };
            round_gadgets.push(MimcRoundGadget::new(
                cs,
                input,
                key.clone(),
                *constant,
                P::EXPONENT,
                output,
                is_last.then(|| finalization.clone()),
                &format!("{annotation}.round{i}"),
            )?);
        }
        tracker.record(cs, annotation);

        Ok(Self {
            rounds: round_gadgets,
            result,
            _params: PhantomData,
        })
    }

    pub fn result(&self) -> Variable {
        self.result
    }

    pub fn num_rounds(&self) -> usize {
        self.rounds.len()
    }
}

impl<P: MimcParameters> Gadget<P::Field> for MimcPermutationGadget<P> {
    fn generate_constraints(&self, cs: &mut ConstraintSystem<P::Field>) {
        self.rounds.generate_constraints(cs);
    }

    fn generate_witness(&self, cs: &mut ConstraintSystem<P::Field>) -> CircuitResult<()> {
        self.rounds.generate_witness(cs)
    }
}

/// Miyaguchi–Preneel compression `H(x, y) = E_y(x) + y + x`.
#[derive(Debug, Clone)]
pub struct MimcCompressionGadget<P: MimcParameters> {
    permutation: MimcPermutationGadget<P>,
}

impl<P: MimcParameters> MimcCompressionGadget<P> {
    pub fn new(
        cs: &mut ConstraintSystem<P::Field>,
        x: LinearCombination<P::Field>,
        y: LinearCombination<P::Field>,
        result: Variable,
        annotation: &str,
    ) -> CircuitResult<Self> {
        let permutation =
            MimcPermutationGadget::new(cs, x.clone(), y, Some(x), result, annotation)?;
        Ok(Self { permutation })
    }

    pub fn result(&self) -> Variable {
        self.permutation.result()
    }
}

impl<P: MimcParameters> Gadget<P::Field> for MimcCompressionGadget<P> {
    fn generate_constraints(&self, cs: &mut ConstraintSystem<P::Field>) {
        self.permutation.generate_constraints(cs);
    }

    fn generate_witness(&self, cs: &mut ConstraintSystem<P::Field>) -> CircuitResult<()> {
        self.permutation.generate_witness(cs)
    }
}
