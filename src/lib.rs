//! R1CS gadgets for shielded transactions over the BN254 scalar field.
//!
//! The crate has three layers:
//!
//! 1. `core`: errors, field element encodings and bit-vector helpers.
//! 2. `snarks`: the constraint system, the [`Gadget`] protocol and a JSON
//!    export for circuit audits.
//! 3. `circuits`: the MiMC permutation and compression gadgets, the Merkle
//!    path selector and authenticator, and the packed value-conservation check.
//!
//! A circuit is built by allocating variables, constructing gadgets over them,
//! emitting constraints once, and then assigning witnesses in dependency order:
//!
//! ```rust
//! use ark_bn254::Fr;
//! use shielded_circuits::{
//!     mimc_permutation, ConstraintSystem, Gadget, MimcBn254, MimcPermutationGadget,
//! };
//! # fn main() -> Result<(), shielded_circuits::CircuitError> {
//!
//! let mut cs = ConstraintSystem::<Fr>::new();
//! let msg = cs.allocate("msg");
//! let key = cs.allocate("key");
//! let out = cs.allocate_primary("out");
//! let gadget =
//!     MimcPermutationGadget::<MimcBn254>::new(&mut cs, msg.into(), key.into(), None, out, "mimc")?;
//! gadget.generate_constraints(&mut cs);
//!
//! cs.set_value(msg, Fr::from(3u64))?;
//! cs.set_value(key, Fr::from(4u64))?;
//! gadget.generate_witness(&mut cs)?;
//!
//! assert!(cs.is_satisfied());
//! assert_eq!(cs.value(out)?, mimc_permutation::<MimcBn254>(Fr::from(3u64), Fr::from(4u64)));
//! # Ok(())
//! # }
//! ```

pub mod circuits;
pub mod core;
pub mod snarks;

pub use crate::core::errors::{CircuitError, CircuitResult};
pub use crate::core::field_utils::{
    bytes_to_field, extension_field_from_bytes, extension_field_to_bytes, field_to_bytes,
    field_to_hex, hex_to_field,
};
pub use circuits::{
    compute_merkle_root, mimc_compress, mimc_permutation, BitArray, MerklePathAuthenticatorGadget,
    MerklePathComputeGadget, MerklePathSelector, MimcBn254, MimcBn254E7, MimcCompressionGadget,
    MimcParameters, MimcPermutationGadget, PackedValueConservationGadget, VALUE_BITS,
};
pub use snarks::{ConstraintSystem, ConstraintSystemExport, Gadget, LinearCombination, Variable};
