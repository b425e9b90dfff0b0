use crate::core::errors::{CircuitError, CircuitResult};
use crate::core::field_utils::field_to_bytes;
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Handle to one slot of the witness vector owned by a [`ConstraintSystem`].
///
/// The full assignment is laid out as `[1, primary…, auxiliary…]`, so public
/// inputs always precede private ones no matter the allocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// The constant `1` at index 0.
    One,
    Primary(usize),
    Auxiliary(usize),
}

impl Variable {
    /// Position of this variable inside the full assignment vector.
    pub fn full_index(self, num_primary: usize) -> usize {
        match self {
            Variable::One => 0,
            Variable::Primary(i) => 1 + i,
            Variable::Auxiliary(j) => 1 + num_primary + j,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::One => write!(f, "ONE"),
            Variable::Primary(i) => write!(f, "x{i}"),
            Variable::Auxiliary(j) => write!(f, "w{j}"),
        }
    }
}

/// Sparse `Σ coeff_i * var_i + constant`. Zero coefficients are never stored
/// and the constant slot absorbs any `Variable::One` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearCombination<F: PrimeField> {
    terms: BTreeMap<Variable, F>,
    constant: F,
}

impl<F: PrimeField> LinearCombination<F> {
    pub fn zero() -> Self {
        Self {
            terms: BTreeMap::new(),
            constant: F::zero(),
        }
    }

    pub fn constant(value: F) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant: value,
        }
    }

    pub fn term(variable: Variable, coeff: F) -> Self {
        let mut lc = Self::zero();
        lc.add_term(variable, coeff);
        lc
    }

    pub fn add_term(&mut self, variable: Variable, coeff: F) {
        if variable == Variable::One {
            self.constant += coeff;
            return;
        }
        let entry = self.terms.entry(variable).or_insert_with(F::zero);
        *entry += coeff;
        if entry.is_zero() {
            self.terms.remove(&variable);
        }
    }

    pub fn with_term(mut self, variable: Variable, coeff: F) -> Self {
        self.add_term(variable, coeff);
        self
    }

    pub fn constant_term(&self) -> F {
        self.constant
    }

    /// Non-constant terms in variable order.
    pub fn terms(&self) -> impl Iterator<Item = (Variable, F)> + '_ {
        self.terms.iter().map(|(var, coeff)| (*var, *coeff))
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.terms.keys().copied()
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty() && self.constant.is_zero()
    }

    /// Evaluates the combination through a value lookup.
    pub fn evaluate<V>(&self, mut value_of: V) -> CircuitResult<F>
    where
        V: FnMut(Variable) -> CircuitResult<F>,
    {
        let mut acc = self.constant;
        for (var, coeff) in &self.terms {
            acc += *coeff * value_of(*var)?;
        }
        Ok(acc)
    }

    /// Evaluates against a full `[1, primary…, auxiliary…]` assignment.
    pub fn evaluate_full(&self, assignment: &[F], num_primary: usize) -> Option<F> {
        let mut acc = self.constant;
        for (var, coeff) in &self.terms {
            acc += *coeff * assignment.get(var.full_index(num_primary))?;
        }
        Some(acc)
    }

    /// `(index, coefficient)` pairs over the full assignment, constant at index 0.
    pub fn to_sparse(&self, num_primary: usize) -> Vec<(usize, F)> {
        let mut out = Vec::with_capacity(self.terms.len() + 1);
        if !self.constant.is_zero() {
            out.push((0, self.constant));
        }
        for (var, coeff) in &self.terms {
            out.push((var.full_index(num_primary), *coeff));
        }
        out
    }
}

impl<F: PrimeField> From<Variable> for LinearCombination<F> {
    fn from(variable: Variable) -> Self {
        Self::term(variable, F::one())
    }
}

impl<F: PrimeField> From<&LinearCombination<F>> for LinearCombination<F> {
    fn from(lc: &LinearCombination<F>) -> Self {
        lc.clone()
    }
}

impl<F: PrimeField> AddAssign<&LinearCombination<F>> for LinearCombination<F> {
    fn add_assign(&mut self, other: &LinearCombination<F>) {
        self.constant += other.constant;
        for (var, coeff) in &other.terms {
            self.add_term(*var, *coeff);
        }
    }
}

impl<F: PrimeField> Add<&LinearCombination<F>> for LinearCombination<F> {
    type Output = LinearCombination<F>;

    fn add(mut self, other: &LinearCombination<F>) -> Self::Output {
        self += other;
        self
    }
}

impl<F: PrimeField> Add<LinearCombination<F>> for LinearCombination<F> {
    type Output = LinearCombination<F>;

    fn add(self, other: LinearCombination<F>) -> Self::Output {
        self + &other
    }
}

impl<F: PrimeField> Add<Variable> for LinearCombination<F> {
    type Output = LinearCombination<F>;

    fn add(self, variable: Variable) -> Self::Output {
        self.with_term(variable, F::one())
    }
}

impl<F: PrimeField> Neg for LinearCombination<F> {
    type Output = LinearCombination<F>;

    fn neg(self) -> Self::Output {
        self * -F::one()
    }
}

impl<F: PrimeField> Sub<&LinearCombination<F>> for LinearCombination<F> {
    type Output = LinearCombination<F>;

    fn sub(self, other: &LinearCombination<F>) -> Self::Output {
        self + &(other.clone() * -F::one())
    }
}

impl<F: PrimeField> Sub<LinearCombination<F>> for LinearCombination<F> {
    type Output = LinearCombination<F>;

    fn sub(self, other: LinearCombination<F>) -> Self::Output {
        self - &other
    }
}

impl<F: PrimeField> Sub<Variable> for LinearCombination<F> {
    type Output = LinearCombination<F>;

    fn sub(self, variable: Variable) -> Self::Output {
        self.with_term(variable, -F::one())
    }
}

impl<F: PrimeField> Mul<F> for LinearCombination<F> {
    type Output = LinearCombination<F>;

    fn mul(self, scalar: F) -> Self::Output {
        if scalar.is_zero() {
            return Self::zero();
        }
        Self {
            terms: self
                .terms
                .into_iter()
                .map(|(var, coeff)| (var, coeff * scalar))
                .collect(),
            constant: self.constant * scalar,
        }
    }
}

/// Describes a single R1CS constraint `<a, z> * <b, z> = <c, z>`.
#[derive(Debug, Clone)]
pub struct Constraint<F: PrimeField> {
    pub a: LinearCombination<F>,
    pub b: LinearCombination<F>,
    pub c: LinearCombination<F>,
    pub annotation: String,
}

impl<F: PrimeField> Constraint<F> {
    pub fn evaluate(&self, assignment: &[F], num_primary: usize) -> Option<(F, F, F)> {
        Some((
            self.a.evaluate_full(assignment, num_primary)?,
            self.b.evaluate_full(assignment, num_primary)?,
            self.c.evaluate_full(assignment, num_primary)?,
        ))
    }

    pub fn is_satisfied_by(&self, assignment: &[F], num_primary: usize) -> bool {
        match self.evaluate(assignment, num_primary) {
            Some((az, bz, cz)) => az * bz == cz,
            None => false,
        }
    }

    fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.a
            .variables()
            .chain(self.b.variables())
            .chain(self.c.variables())
    }
}

/// Ordered constraints plus the witness slots they range over.
///
/// Constraint emission is not idempotent: emitting a gadget's constraints
/// twice duplicates them. Callers emit each gadget exactly once.
#[derive(Debug, Clone)]
pub struct ConstraintSystem<F: PrimeField> {
    primary_values: Vec<Option<F>>,
    auxiliary_values: Vec<Option<F>>,
    primary_annotations: Vec<String>,
    auxiliary_annotations: Vec<String>,
    constraints: Vec<Constraint<F>>,
}

impl<F: PrimeField> Default for ConstraintSystem<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: PrimeField> ConstraintSystem<F> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-sizes constraint storage for circuits with a known shape.
    pub fn with_capacity(num_constraints: usize) -> Self {
        Self {
            primary_values: Vec::new(),
            auxiliary_values: Vec::new(),
            primary_annotations: Vec::new(),
            auxiliary_annotations: Vec::new(),
            constraints: Vec::with_capacity(num_constraints),
        }
    }

    /// Appends one auxiliary (private) witness slot.
    pub fn allocate(&mut self, annotation: impl Into<String>) -> Variable {
        self.auxiliary_values.push(None);
        self.auxiliary_annotations.push(annotation.into());
        Variable::Auxiliary(self.auxiliary_values.len() - 1)
    }

    /// Appends one primary (public) input slot.
    pub fn allocate_primary(&mut self, annotation: impl Into<String>) -> Variable {
        self.primary_values.push(None);
        self.primary_annotations.push(annotation.into());
        Variable::Primary(self.primary_values.len() - 1)
    }

    pub fn is_allocated(&self, variable: Variable) -> bool {
        match variable {
            Variable::One => true,
            Variable::Primary(i) => i < self.primary_values.len(),
            Variable::Auxiliary(j) => j < self.auxiliary_values.len(),
        }
    }

    /// Appends `a * b = c`.
    ///
    /// Panics if the constraint references a variable not allocated on this
    /// system.
    pub fn add_constraint(
        &mut self,
        a: impl Into<LinearCombination<F>>,
        b: impl Into<LinearCombination<F>>,
        c: impl Into<LinearCombination<F>>,
        annotation: impl Into<String>,
    ) {
        let constraint = Constraint {
            a: a.into(),
            b: b.into(),
            c: c.into(),
            annotation: annotation.into(),
        };
        for var in constraint.variables() {
            assert!(
                self.is_allocated(var),
                "constraint '{}' references unallocated variable {}",
                constraint.annotation,
                var
            );
        }
        self.constraints.push(constraint);
    }

    /// `var * (1 - var) = 0`
    pub fn enforce_boolean(&mut self, variable: Variable, annotation: impl Into<String>) {
        let one_minus = LinearCombination::constant(F::one()) - variable;
        self.add_constraint(variable, one_minus, LinearCombination::zero(), annotation);
    }

    /// `1 * lhs = rhs`
    pub fn enforce_equal(
        &mut self,
        lhs: impl Into<LinearCombination<F>>,
        rhs: impl Into<LinearCombination<F>>,
        annotation: impl Into<String>,
    ) {
        self.add_constraint(LinearCombination::constant(F::one()), lhs, rhs, annotation);
    }

    pub fn set_value(&mut self, variable: Variable, value: F) -> CircuitResult<()> {
        let slot = match variable {
            Variable::One => {
                return Err(CircuitError::invalid_parameters(
                    "the constant variable cannot be assigned",
                ))
            }
            Variable::Primary(i) => self.primary_values.get_mut(i),
            Variable::Auxiliary(j) => self.auxiliary_values.get_mut(j),
        };
        let slot = slot.ok_or_else(|| {
            CircuitError::InvalidParameters(format!("variable {variable} is not allocated"))
        })?;
        *slot = Some(value);
        Ok(())
    }

    pub fn value(&self, variable: Variable) -> CircuitResult<F> {
        let slot = match variable {
            Variable::One => return Ok(F::one()),
            Variable::Primary(i) => self.primary_values.get(i),
            Variable::Auxiliary(j) => self.auxiliary_values.get(j),
        };
        slot.copied()
            .flatten()
            .ok_or_else(|| CircuitError::unassigned(variable))
    }

    pub fn eval(&self, lc: &LinearCombination<F>) -> CircuitResult<F> {
        lc.evaluate(|var| self.value(var))
    }

    pub fn annotation(&self, variable: Variable) -> &str {
        match variable {
            Variable::One => "ONE",
            Variable::Primary(i) => self.primary_annotations.get(i).map_or("", String::as_str),
            Variable::Auxiliary(j) => self.auxiliary_annotations.get(j).map_or("", String::as_str),
        }
    }

    pub fn num_primary(&self) -> usize {
        self.primary_values.len()
    }

    pub fn num_auxiliary(&self) -> usize {
        self.auxiliary_values.len()
    }

    /// Primary plus auxiliary variables, excluding the constant.
    pub fn num_variables(&self) -> usize {
        self.num_primary() + self.num_auxiliary()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraints(&self) -> &[Constraint<F>] {
        &self.constraints
    }

    /// Variables in full-assignment order, constant first.
    pub fn variables(&self) -> impl Iterator<Item = Variable> {
        std::iter::once(Variable::One)
            .chain((0..self.num_primary()).map(Variable::Primary))
            .chain((0..self.num_auxiliary()).map(Variable::Auxiliary))
    }

    pub fn primary_input(&self) -> CircuitResult<Vec<F>> {
        (0..self.num_primary())
            .map(|i| self.value(Variable::Primary(i)))
            .collect()
    }

    pub fn auxiliary_input(&self) -> CircuitResult<Vec<F>> {
        (0..self.num_auxiliary())
            .map(|j| self.value(Variable::Auxiliary(j)))
            .collect()
    }

    /// `[1, primary…, auxiliary…]`
    pub fn full_assignment(&self) -> CircuitResult<Vec<F>> {
        let mut assignment = Vec::with_capacity(1 + self.num_variables());
        assignment.push(F::one());
        assignment.extend(self.primary_input()?);
        assignment.extend(self.auxiliary_input()?);
        Ok(assignment)
    }

    /// Index of the first constraint that does not hold under `assignment`.
    pub fn first_unsatisfied(&self, assignment: &[F]) -> Option<usize> {
        let num_primary = self.num_primary();
        let idx = self
            .constraints
            .iter()
            .position(|c| !c.is_satisfied_by(assignment, num_primary))?;
        let failing = &self.constraints[idx];
        if let Some((az, bz, cz)) = failing.evaluate(assignment, num_primary) {
            tracing::debug!(
                "[r1cs] first failing constraint #{} '{}': a={} b={} c={}",
                idx,
                failing.annotation,
                az,
                bz,
                cz
            );
        }
        Some(idx)
    }

    /// True iff every constraint holds exactly under `assignment`.
    pub fn is_satisfied_by(&self, assignment: &[F]) -> bool {
        if assignment.len() != 1 + self.num_variables() || assignment[0] != F::one() {
            tracing::debug!(
                "[r1cs] assignment of length {} does not fit {} variables",
                assignment.len(),
                self.num_variables()
            );
            return false;
        }
        self.first_unsatisfied(assignment).is_none()
    }

    /// Checks the stored witness. An incomplete witness is reported unsatisfied.
    pub fn is_satisfied(&self) -> bool {
        match self.full_assignment() {
            Ok(assignment) => self.is_satisfied_by(&assignment),
            Err(err) => {
                tracing::warn!("[r1cs] satisfiability check on incomplete witness: {}", err);
                false
            }
        }
    }

    /// SHA-256 fingerprint of the constraint matrices and variable counts.
    pub fn digest(&self) -> [u8; 32] {
        let num_primary = self.num_primary();
        let mut hasher = Sha256::new();
        hasher.update((num_primary as u64).to_le_bytes());
        hasher.update((self.num_auxiliary() as u64).to_le_bytes());
        for constraint in &self.constraints {
            absorb_sparse_row(&mut hasher, &constraint.a.to_sparse(num_primary));
            absorb_sparse_row(&mut hasher, &constraint.b.to_sparse(num_primary));
            absorb_sparse_row(&mut hasher, &constraint.c.to_sparse(num_primary));
        }
        hasher.finalize().into()
    }
}

fn absorb_sparse_row<F: PrimeField>(hasher: &mut Sha256, values: &[(usize, F)]) {
    hasher.update((values.len() as u64).to_le_bytes());
    for (idx, coeff) in values {
        hasher.update((*idx as u64).to_le_bytes());
        hasher.update(field_to_bytes(coeff));
    }
}

/// Logs how many constraints and variables each construction stage added.
pub struct ConstraintTracker {
    last_constraints: usize,
    last_variables: usize,
}

impl ConstraintTracker {
    pub fn new<F: PrimeField>(cs: &ConstraintSystem<F>) -> Self {
        Self {
            last_constraints: cs.num_constraints(),
            last_variables: cs.num_variables(),
        }
    }

    /// Returns `(Δconstraints, Δvariables)` since the previous record.
    pub fn record<F: PrimeField>(&mut self, cs: &ConstraintSystem<F>, label: &str) -> (usize, usize) {
        let constraints = cs.num_constraints();
        let variables = cs.num_variables();
        let delta_constraints = constraints.saturating_sub(self.last_constraints);
        let delta_variables = variables.saturating_sub(self.last_variables);
        tracing::debug!(
            "[r1cs][stats] {:<32} Δc={:>6} (total {:>8}), Δv={:>6} (total {:>8})",
            label,
            delta_constraints,
            constraints,
            delta_variables,
            variables
        );
        self.last_constraints = constraints;
        self.last_variables = variables;
        (delta_constraints, delta_variables)
    }
}
