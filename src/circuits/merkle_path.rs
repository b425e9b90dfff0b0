//! Merkle authentication paths over MiMC compression.
//!
//! Level `i` orders the running node and `path[i]` with a
//! [`MerklePathSelector`] driven by `address_bits[i]`, then compresses the
//! pair as `H(left, right)`. Levels run from the leaf upwards.

use super::mimc::{mimc_compress, MimcParameters};
use super::mimc_gadget::MimcCompressionGadget;
use super::selector::MerklePathSelector;
use crate::core::errors::{CircuitError, CircuitResult};
use crate::snarks::gadget::Gadget;
use crate::snarks::r1cs::{ConstraintSystem, ConstraintTracker, LinearCombination, Variable};
use ark_ff::Zero;

/// Root of the tree containing `leaf`, given its siblings from the leaf level up.
pub fn compute_merkle_root<P: MimcParameters>(
    leaf: P::Field,
    path: &[P::Field],
    address_bits: &[bool],
) -> CircuitResult<P::Field> {
    check_depth(path.len(), address_bits.len())?;
    let root = path
        .iter()
        .zip(address_bits)
        .fold(leaf, |node, (sibling, is_right)| {
            if *is_right {
                mimc_compress::<P>(*sibling, node)
            } else {
                mimc_compress::<P>(node, *sibling)
            }
        });
    Ok(root)
}

fn check_depth(path_len: usize, bits_len: usize) -> CircuitResult<()> {
    if path_len == 0 {
        return Err(CircuitError::invalid_parameters(
            "merkle path depth must be at least 1",
        ));
    }
    if path_len != bits_len {
        return Err(CircuitError::InvalidParameters(format!(
            "merkle path has {path_len} siblings but {bits_len} address bits"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct MerkleLevel<P: MimcParameters> {
    selector: MerklePathSelector<P::Field>,
    hasher: MimcCompressionGadget<P>,
}

/// Recomputes a Merkle root from a leaf and its authentication path.
///
/// `address_bits` and `path` are borrowed; range-checking the address bits is
/// left to the selectors' booleanity constraints.
#[derive(Debug, Clone)]
pub struct MerklePathComputeGadget<P: MimcParameters> {
    levels: Vec<MerkleLevel<P>>,
    root: Variable,
}

impl<P: MimcParameters> MerklePathComputeGadget<P> {
    pub fn new(
        cs: &mut ConstraintSystem<P::Field>,
        leaf: LinearCombination<P::Field>,
        path: &[Variable],
        address_bits: &[Variable],
        annotation: &str,
    ) -> CircuitResult<Self> {
        check_depth(path.len(), address_bits.len())?;
        let mut tracker = ConstraintTracker::new(cs);

        let mut levels: Vec<MerkleLevel<P>> = Vec::with_capacity(path.len());
        for (level, (sibling, is_right)) in path.iter().zip(address_bits).enumerate() {
            let node = match levels.last() {
                Some(previous) => LinearCombination::from(previous.hasher.result()),
                None => leaf.clone(),
            };
            let selector = MerklePathSelector::new(
                cs,
                node,
                LinearCombination::from(*sibling),
                *is_right,
                &format!("{annotation}.level{level}.selector"),
            );
            let output = cs.allocate(format!("{annotation}.level{level}.node"));
            let hasher = MimcCompressionGadget::new(
                cs,
                selector.left().into(),
                selector.right().into(),
                output,
                &format!("{annotation}.level{level}.hash"),
            )?;
            levels.push(MerkleLevel { selector, hasher });
        }
        tracker.record(cs, annotation);

        let root = match levels.last() {
            Some(top) => top.hasher.result(),
            None => return Err(CircuitError::invalid_parameters("empty merkle path")),
        };
        Ok(Self { levels, root })
    }

    pub fn root(&self) -> Variable {
        self.root
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }
}

impl<P: MimcParameters> Gadget<P::Field> for MerklePathComputeGadget<P> {
    fn generate_constraints(&self, cs: &mut ConstraintSystem<P::Field>) {
        for level in &self.levels {
            level.selector.generate_constraints(cs);
            level.hasher.generate_constraints(cs);
        }
    }

    fn generate_witness(&self, cs: &mut ConstraintSystem<P::Field>) -> CircuitResult<()> {
        for level in &self.levels {
            level.selector.generate_witness(cs)?;
            level.hasher.generate_witness(cs)?;
        }
        Ok(())
    }
}

/// Checks a Merkle path against an expected root when `enforce = 1`.
///
/// `(computed_root - expected_root) * enforce = 0` lets dummy inputs carry an
/// arbitrary path with `enforce = 0`. `enforce` is expected to be constrained
/// boolean by the caller.
#[derive(Debug, Clone)]
pub struct MerklePathAuthenticatorGadget<P: MimcParameters> {
    path: MerklePathComputeGadget<P>,
    expected_root: LinearCombination<P::Field>,
    enforce: LinearCombination<P::Field>,
    annotation: String,
}

impl<P: MimcParameters> MerklePathAuthenticatorGadget<P> {
    pub fn new(
        cs: &mut ConstraintSystem<P::Field>,
        leaf: LinearCombination<P::Field>,
        path: &[Variable],
        address_bits: &[Variable],
        expected_root: LinearCombination<P::Field>,
        enforce: LinearCombination<P::Field>,
        annotation: &str,
    ) -> CircuitResult<Self> {
        let path = MerklePathComputeGadget::new(cs, leaf, path, address_bits, annotation)?;
        Ok(Self {
            path,
            expected_root,
            enforce,
            annotation: annotation.to_string(),
        })
    }

    pub fn computed_root(&self) -> Variable {
        self.path.root()
    }

    /// Evaluates the authentication check on the current witness.
    pub fn is_valid(&self, cs: &ConstraintSystem<P::Field>) -> CircuitResult<bool> {
        let computed = cs.value(self.computed_root())?;
        let expected = cs.eval(&self.expected_root)?;
        let enforce = cs.eval(&self.enforce)?;
        Ok(((computed - expected) * enforce).is_zero())
    }
}

impl<P: MimcParameters> Gadget<P::Field> for MerklePathAuthenticatorGadget<P> {
    fn generate_constraints(&self, cs: &mut ConstraintSystem<P::Field>) {
        self.path.generate_constraints(cs);
        cs.add_constraint(
            LinearCombination::from(self.computed_root()) - &self.expected_root,
            self.enforce.clone(),
            LinearCombination::zero(),
            format!("{}.root_check", self.annotation),
        );
    }

    fn generate_witness(&self, cs: &mut ConstraintSystem<P::Field>) -> CircuitResult<()> {
        self.path.generate_witness(cs)
    }
}
