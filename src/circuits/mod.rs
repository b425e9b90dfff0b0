//! Gadgets for shielded-transaction circuits.

pub mod bit_array;
pub mod merkle_path;
pub mod mimc;
pub mod mimc_gadget;
pub mod packed_addition;
pub mod selector;

pub use bit_array::BitArray;
pub use merkle_path::{compute_merkle_root, MerklePathAuthenticatorGadget, MerklePathComputeGadget};
pub use mimc::{
    build_round_constants, mimc_compress, mimc_permutation, round_constants, MimcBn254,
    MimcBn254E7, MimcParameters,
};
pub use mimc_gadget::{MimcCompressionGadget, MimcPermutationGadget, MimcRoundGadget};
pub use packed_addition::{packed_addition, PackedValueConservationGadget, VALUE_BITS};
pub use selector::MerklePathSelector;
