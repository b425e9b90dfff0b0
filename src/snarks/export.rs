//! Structured dump of a constraint system for circuit audits.
//!
//! Indices refer to the full assignment `[1, primary…, auxiliary…]`; index 0
//! is the constant `ONE`. Coefficients are `0x`-prefixed big-endian hex.

use super::r1cs::{ConstraintSystem, LinearCombination};
use crate::core::errors::{CircuitError, CircuitResult};
use crate::core::field_utils::field_to_hex;
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermExport {
    pub index: usize,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintExport {
    pub annotation: String,
    pub a: Vec<TermExport>,
    pub b: Vec<TermExport>,
    pub c: Vec<TermExport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSystemExport {
    pub num_variables: usize,
    pub num_constraints: usize,
    pub num_inputs: usize,
    /// One annotation per full-assignment index, starting with `ONE`.
    pub variables: Vec<String>,
    pub constraints: Vec<ConstraintExport>,
}

impl ConstraintSystemExport {
    pub fn to_json_pretty(&self) -> CircuitResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| CircuitError::Serialization(err.to_string()))
    }

    pub fn from_json(json: &str) -> CircuitResult<Self> {
        serde_json::from_str(json).map_err(|err| CircuitError::Serialization(err.to_string()))
    }
}

fn export_row<F: PrimeField>(lc: &LinearCombination<F>, num_primary: usize) -> Vec<TermExport> {
    lc.to_sparse(num_primary)
        .into_iter()
        .map(|(index, coeff)| TermExport {
            index,
            value: field_to_hex(&coeff, true),
        })
        .collect()
}

impl<F: PrimeField> ConstraintSystem<F> {
    pub fn export(&self) -> ConstraintSystemExport {
        let num_primary = self.num_primary();
        ConstraintSystemExport {
            num_variables: self.num_variables(),
            num_constraints: self.num_constraints(),
            num_inputs: num_primary,
            variables: self
                .variables()
                .map(|var| self.annotation(var).to_string())
                .collect(),
            constraints: self
                .constraints()
                .iter()
                .map(|constraint| ConstraintExport {
                    annotation: constraint.annotation.clone(),
                    a: export_row(&constraint.a, num_primary),
                    b: export_row(&constraint.b, num_primary),
                    c: export_row(&constraint.c, num_primary),
                })
                .collect(),
        }
    }
}
