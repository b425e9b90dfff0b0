//! MiMC keyed permutation: parameter sets, round constants and native evaluation.
//!
//! One round maps `r -> (r + key + c[i])^E`. The last round additionally adds
//! `key` and an optional `extra` term to its output, which is what turns the
//! permutation into a Miyaguchi–Preneel compression function when
//! `extra = msg`.
//!
//! Round constants are derived from a public seed by iterated Keccak-256:
//! `c[0] = 0`, `h_1 = keccak(seed)`, `h_{i+1} = keccak(h_i)`,
//! `c[i] = int_be(h_i) mod p`.

use crate::core::errors::{CircuitError, CircuitResult};
use crate::core::field_utils::field_modulus;
use ark_ff::{PrimeField, Zero};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use once_cell::sync::Lazy;
use sha3::{Digest, Keccak256};

/// Compile-time description of one MiMC instantiation.
pub trait MimcParameters: 'static {
    type Field: PrimeField;

    /// Odd exponent with `gcd(EXPONENT, p - 1) = 1`.
    const EXPONENT: u64;

    /// Size of the round-constants table and the default round count.
    const ROUNDS: usize;

    const SEED: &'static [u8];

    /// Round-constants table, built once per process and never mutated.
    ///
    /// Implementations back this with their own `static` [`Lazy`] over
    /// [`build_round_constants`]; concurrent first readers block until the
    /// table is complete and later reads take no lock.
    fn round_constants() -> &'static [Self::Field];
}

/// MiMC over the BN254 scalar field with `x^5`; `ceil(254 / log2(5)) = 110` rounds.
#[derive(Debug, Clone, Copy)]
pub struct MimcBn254;

impl MimcParameters for MimcBn254 {
    type Field = ark_bn254::Fr;
    const EXPONENT: u64 = 5;
    const ROUNDS: usize = 110;
    const SEED: &'static [u8] = b"shielded_circuits_mimc_seed";

    fn round_constants() -> &'static [ark_bn254::Fr] {
        static TABLE: Lazy<Vec<ark_bn254::Fr>> = Lazy::new(build_round_constants::<MimcBn254>);
        TABLE.as_slice()
    }
}

/// MiMC over the BN254 scalar field with `x^7` and 91 rounds.
#[derive(Debug, Clone, Copy)]
pub struct MimcBn254E7;

impl MimcParameters for MimcBn254E7 {
    type Field = ark_bn254::Fr;
    const EXPONENT: u64 = 7;
    const ROUNDS: usize = 91;
    const SEED: &'static [u8] = b"shielded_circuits_mimc_seed";

    fn round_constants() -> &'static [ark_bn254::Fr] {
        static TABLE: Lazy<Vec<ark_bn254::Fr>> = Lazy::new(build_round_constants::<MimcBn254E7>);
        TABLE.as_slice()
    }
}

pub const MIN_ROUNDS: usize = 2;

/// Process-wide round-constants table for `P`.
pub fn round_constants<P: MimcParameters>() -> &'static [P::Field] {
    P::round_constants()
}

/// Initializer for [`MimcParameters::round_constants`] tables.
pub fn build_round_constants<P: MimcParameters>() -> Vec<P::Field> {
    let table = generate_round_constants(P::SEED, P::ROUNDS);
    tracing::debug!(
        "[mimc] generated {} round constants for exponent {}",
        table.len(),
        P::EXPONENT
    );
    table
}

/// Deterministic table of `rounds` constants derived from `seed`.
pub fn generate_round_constants<F: PrimeField>(seed: &[u8], rounds: usize) -> Vec<F> {
    let mut constants = Vec::with_capacity(rounds);
    if rounds == 0 {
        return constants;
    }
    constants.push(F::zero());
    let mut digest = seed.to_vec();
    while constants.len() < rounds {
        digest = Keccak256::digest(&digest).to_vec();
        constants.push(F::from_be_bytes_mod_order(&digest));
    }
    constants
}

/// Rejects exponents for which `x -> x^e` is not a permutation of `F`.
pub fn validate_exponent<F: PrimeField>(exponent: u64) -> CircuitResult<()> {
    if exponent < 3 || exponent % 2 == 0 {
        return Err(CircuitError::InvalidParameters(format!(
            "MiMC exponent must be odd and at least 3, got {exponent}"
        )));
    }
    let order_mod_e = (field_modulus::<F>() - 1u32) % BigUint::from(exponent);
    let residue = order_mod_e.to_u64().unwrap_or_default();
    if gcd_u64(exponent, residue) != 1 {
        return Err(CircuitError::InvalidParameters(format!(
            "MiMC exponent {exponent} is not coprime to p - 1"
        )));
    }
    Ok(())
}

fn gcd_u64(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let tmp = b;
        b = a % b;
        a = tmp;
    }
    a
}

/// One multiplication in the left-to-right square-and-multiply chain for `x^E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStep {
    /// `acc * acc`
    Square,
    /// `acc * x`
    MultiplyBase,
}

impl ChainStep {
    pub fn apply<F: PrimeField>(self, acc: F, base: F) -> F {
        match self {
            ChainStep::Square => acc.square(),
            ChainStep::MultiplyBase => acc * base,
        }
    }
}

/// Multiplications certifying `y = x^exponent`, starting from `acc = x`.
///
/// `x^5` is `[Square, Square, MultiplyBase]`; `x^7` is
/// `[Square, MultiplyBase, Square, MultiplyBase]`.
pub fn exponent_chain(exponent: u64) -> Vec<ChainStep> {
    let mut steps = Vec::new();
    if exponent < 2 {
        return steps;
    }
    let top = 63 - exponent.leading_zeros();
    for bit in (0..top).rev() {
        steps.push(ChainStep::Square);
        if (exponent >> bit) & 1 == 1 {
            steps.push(ChainStep::MultiplyBase);
        }
    }
    steps
}

/// `(input + key + constant)^exponent`
pub fn mimc_round<F: PrimeField>(input: F, key: F, constant: F, exponent: u64) -> F {
    (input + key + constant).pow([exponent])
}

/// Applies `rounds` rounds of the permutation; the last round adds `key + extra`.
pub fn mimc_permutation_with_rounds<P: MimcParameters>(
    msg: P::Field,
    key: P::Field,
    extra: P::Field,
    rounds: usize,
) -> CircuitResult<P::Field> {
    check_round_count::<P>(rounds)?;
    let constants = round_constants::<P>();
    let mut state = msg;
    for constant in constants.iter().take(rounds) {
        state = mimc_round(state, key, *constant, P::EXPONENT);
    }
    Ok(state + key + extra)
}

/// Full-round permutation `E_key(msg) + key`.
pub fn mimc_permutation<P: MimcParameters>(msg: P::Field, key: P::Field) -> P::Field {
    mimc_full_rounds::<P>(msg, key, P::Field::zero())
}

/// Miyaguchi–Preneel compression `E_y(x) + y + x`.
pub fn mimc_compress<P: MimcParameters>(x: P::Field, y: P::Field) -> P::Field {
    mimc_full_rounds::<P>(x, y, x)
}

fn mimc_full_rounds<P: MimcParameters>(
    msg: P::Field,
    key: P::Field,
    extra: P::Field,
) -> P::Field {
    let mut state = msg;
    for constant in round_constants::<P>() {
        state = mimc_round(state, key, *constant, P::EXPONENT);
    }
    state + key + extra
}

/// Validates a round count against `P` before anything is allocated.
pub(crate) fn check_round_count<P: MimcParameters>(rounds: usize) -> CircuitResult<()> {
    if rounds < MIN_ROUNDS {
        return Err(CircuitError::InvalidParameters(format!(
            "MiMC needs at least {MIN_ROUNDS} rounds, got {rounds}"
        )));
    }
    let available = round_constants::<P>().len();
    if available < rounds {
        return Err(CircuitError::InvalidParameters(format!(
            "round-constants table holds {available} entries but {rounds} rounds were requested"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field_utils::field_to_hex;
    use ark_bn254::Fr;
    use ark_ff::{Field, One, Zero};

    #[test]
    fn round_constants_are_deterministic() {
        let table = round_constants::<MimcBn254>();
        assert_eq!(table.len(), MimcBn254::ROUNDS);
        assert_eq!(table[0], Fr::zero());
        assert!(table[1..].iter().all(|c| !c.is_zero()));

        let regenerated: Vec<Fr> = generate_round_constants(MimcBn254::SEED, MimcBn254::ROUNDS);
        assert_eq!(table, regenerated.as_slice());

        // Cached: the same allocation is handed out every time.
        assert!(std::ptr::eq(table, round_constants::<MimcBn254>()));
    }

    #[test]
    fn first_constant_is_keccak_of_seed() {
        let digest = Keccak256::digest(MimcBn254::SEED);
        let table = round_constants::<MimcBn254>();
        assert_eq!(table[1], Fr::from_be_bytes_mod_order(&digest));
        let second = Keccak256::digest(digest);
        assert_eq!(table[2], Fr::from_be_bytes_mod_order(&second));
    }

    #[test]
    fn pinned_known_answers() {
        let table = round_constants::<MimcBn254>();
        assert_eq!(
            field_to_hex(&table[1], true),
            "0x1f367c673946c6053c1ac4e565c659a50fdd5df4068aed5a9f79001d58604e8f"
        );

        let (one, two) = (Fr::from(1u64), Fr::from(2u64));
        assert_eq!(
            field_to_hex(&mimc_permutation::<MimcBn254>(one, two), false),
            "2f0aa8680711dc3faeb65f1ab85d623f4c334ef3ff50a3f849e7e43ea65c4426"
        );
        assert_eq!(
            field_to_hex(&mimc_compress::<MimcBn254>(one, two), false),
            "2f0aa8680711dc3faeb65f1ab85d623f4c334ef3ff50a3f849e7e43ea65c4427"
        );
        assert_eq!(
            field_to_hex(&mimc_permutation::<MimcBn254E7>(one, two), false),
            "25ac4eaf6a60afae2a274282838c45c6edc4e06f891a0c1e0990a15cad382cfd"
        );
    }

    #[test]
    fn parameter_sets_get_distinct_tables() {
        assert_eq!(round_constants::<MimcBn254E7>().len(), 91);
        // Same seed and field, so the shorter table is a prefix of the longer one.
        assert_eq!(
            round_constants::<MimcBn254E7>(),
            &round_constants::<MimcBn254>()[..91]
        );
    }

    #[test]
    fn exponent_chains() {
        use ChainStep::*;
        assert_eq!(exponent_chain(3), vec![Square, MultiplyBase]);
        assert_eq!(exponent_chain(5), vec![Square, Square, MultiplyBase]);
        assert_eq!(
            exponent_chain(7),
            vec![Square, MultiplyBase, Square, MultiplyBase]
        );
        assert_eq!(exponent_chain(17).len(), 5);

        let x = Fr::from(3u64);
        for exponent in [3u64, 5, 7, 17] {
            let value = exponent_chain(exponent)
                .into_iter()
                .fold(x, |acc, step| step.apply(acc, x));
            assert_eq!(value, x.pow([exponent]));
        }
    }

    #[test]
    fn exponent_validation() {
        assert!(validate_exponent::<Fr>(5).is_ok());
        assert!(validate_exponent::<Fr>(7).is_ok());
        // p - 1 is divisible by 3 for BN254.
        assert!(validate_exponent::<Fr>(3).is_err());
        assert!(validate_exponent::<Fr>(4).is_err());
        assert!(validate_exponent::<Fr>(1).is_err());
    }

    #[test]
    fn round_count_limits() {
        assert!(check_round_count::<MimcBn254>(1).is_err());
        assert!(check_round_count::<MimcBn254>(2).is_ok());
        assert!(check_round_count::<MimcBn254>(MimcBn254::ROUNDS).is_ok());
        assert!(check_round_count::<MimcBn254>(MimcBn254::ROUNDS + 1).is_err());
    }

    #[test]
    fn native_permutation_matches_explicit_rounds() {
        let msg = Fr::from(42u64);
        let key = Fr::from(7u64);
        let full = mimc_permutation::<MimcBn254>(msg, key);
        let explicit =
            mimc_permutation_with_rounds::<MimcBn254>(msg, key, Fr::zero(), MimcBn254::ROUNDS)
                .unwrap();
        assert_eq!(full, explicit);

        let two_rounds =
            mimc_permutation_with_rounds::<MimcBn254>(msg, key, Fr::one(), 2).unwrap();
        let c = round_constants::<MimcBn254>();
        let r0 = (msg + key + c[0]).pow([5u64]);
        let expected = (r0 + key + c[1]).pow([5u64]) + key + Fr::one();
        assert_eq!(two_rounds, expected);
    }

    #[test]
    fn compression_adds_message_and_key() {
        let x = Fr::from(1u64);
        let y = Fr::from(2u64);
        assert_eq!(
            mimc_compress::<MimcBn254>(x, y),
            mimc_permutation::<MimcBn254>(x, y) + x
        );
        assert_ne!(
            mimc_compress::<MimcBn254>(x, y),
            mimc_compress::<MimcBn254>(y, x)
        );
    }

    #[test]
    fn concurrent_first_access_sees_one_table() {
        struct ConcurrentParams;
        impl MimcParameters for ConcurrentParams {
            type Field = Fr;
            const EXPONENT: u64 = 5;
            const ROUNDS: usize = 64;
            const SEED: &'static [u8] = b"concurrent_first_access";

            fn round_constants() -> &'static [Fr] {
                static TABLE: Lazy<Vec<Fr>> =
                    Lazy::new(build_round_constants::<ConcurrentParams>);
                TABLE.as_slice()
            }
        }

        let tables: Vec<&'static [Fr]> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(round_constants::<ConcurrentParams>))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("reader thread panicked"))
                .collect()
        });
        for table in &tables {
            assert_eq!(table.len(), 64);
            assert!(std::ptr::eq(*table, tables[0]));
        }
    }
}
