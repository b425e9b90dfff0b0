//! Rank-1 constraint systems and the gadget protocol built on them.

pub mod export;
pub mod gadget;
pub mod r1cs;

pub use export::{ConstraintExport, ConstraintSystemExport, TermExport};
pub use gadget::Gadget;
pub use r1cs::{Constraint, ConstraintSystem, ConstraintTracker, LinearCombination, Variable};
