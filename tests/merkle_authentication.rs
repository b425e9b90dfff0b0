use ark_bn254::Fr;
use ark_ff::{One, UniformRand, Zero};
use rand::{rngs::StdRng, Rng, SeedableRng};
use shielded_circuits::{
    compute_merkle_root, mimc_compress, ConstraintSystem, Gadget, MerklePathAuthenticatorGadget,
    MimcBn254, Variable,
};

const DEPTH: usize = 4;

/// Full binary tree of depth [`DEPTH`] stored level by level, leaves first.
struct Tree {
    levels: Vec<Vec<Fr>>,
}

impl Tree {
    fn random(rng: &mut StdRng) -> Self {
        let leaves: Vec<Fr> = (0..1 << DEPTH).map(|_| Fr::rand(rng)).collect();
        let mut levels = vec![leaves];
        while levels.last().map_or(0, Vec::len) > 1 {
            let below = levels.last().expect("non-empty");
            let above = below
                .chunks(2)
                .map(|pair| mimc_compress::<MimcBn254>(pair[0], pair[1]))
                .collect();
            levels.push(above);
        }
        Self { levels }
    }

    fn root(&self) -> Fr {
        self.levels[DEPTH][0]
    }

    /// Siblings and address bits for `index`, leaf level first.
    fn path(&self, index: usize) -> (Vec<Fr>, Vec<bool>) {
        (0..DEPTH)
            .map(|level| {
                let position = index >> level;
                (self.levels[level][position ^ 1], position & 1 == 1)
            })
            .unzip()
    }
}

struct AuthCircuit {
    cs: ConstraintSystem<Fr>,
    gadget: MerklePathAuthenticatorGadget<MimcBn254>,
    root: Variable,
    leaf: Variable,
    path: Vec<Variable>,
    address: Vec<Variable>,
    enforce: Variable,
}

fn auth_circuit() -> AuthCircuit {
    let mut cs = ConstraintSystem::<Fr>::new();
    let root = cs.allocate_primary("root");
    let leaf = cs.allocate("leaf");
    let path: Vec<Variable> = (0..DEPTH).map(|i| cs.allocate(format!("path[{i}]"))).collect();
    let address: Vec<Variable> = (0..DEPTH)
        .map(|i| cs.allocate(format!("address[{i}]")))
        .collect();
    let enforce = cs.allocate("enforce");
    cs.enforce_boolean(enforce, "enforce boolean");

    let gadget = MerklePathAuthenticatorGadget::<MimcBn254>::new(
        &mut cs,
        leaf.into(),
        &path,
        &address,
        root.into(),
        enforce.into(),
        "merkle",
    )
    .expect("depth and path agree");
    gadget.generate_constraints(&mut cs);

    AuthCircuit {
        cs,
        gadget,
        root,
        leaf,
        path,
        address,
        enforce,
    }
}

impl AuthCircuit {
    fn assign(&mut self, root: Fr, leaf: Fr, siblings: &[Fr], bits: &[bool], enforce: bool) {
        let cs = &mut self.cs;
        cs.set_value(self.root, root).expect("allocated");
        cs.set_value(self.leaf, leaf).expect("allocated");
        for (var, value) in self.path.iter().zip(siblings) {
            cs.set_value(*var, *value).expect("allocated");
        }
        for (var, bit) in self.address.iter().zip(bits) {
            cs.set_value(*var, if *bit { Fr::one() } else { Fr::zero() })
                .expect("allocated");
        }
        cs.set_value(self.enforce, if enforce { Fr::one() } else { Fr::zero() })
            .expect("allocated");
        self.gadget
            .generate_witness(cs)
            .expect("every input is assigned");
    }
}

#[test]
fn every_leaf_authenticates_against_the_root() {
    let mut rng = StdRng::seed_from_u64(2024);
    let tree = Tree::random(&mut rng);
    let mut circuit = auth_circuit();

    for index in [0usize, 5, 10, (1 << DEPTH) - 1] {
        let (siblings, bits) = tree.path(index);
        let leaf = tree.levels[0][index];
        assert_eq!(
            compute_merkle_root::<MimcBn254>(leaf, &siblings, &bits).expect("well-formed path"),
            tree.root()
        );

        circuit.assign(tree.root(), leaf, &siblings, &bits, true);
        assert!(circuit.cs.is_satisfied(), "leaf {index} failed");
        assert_eq!(
            circuit
                .cs
                .value(circuit.gadget.computed_root())
                .expect("assigned"),
            tree.root()
        );
    }
}

#[test]
fn wrong_leaf_fails_only_when_enforced() {
    let mut rng = StdRng::seed_from_u64(77);
    let tree = Tree::random(&mut rng);
    let mut circuit = auth_circuit();
    let index = rng.gen_range(0..1 << DEPTH);
    let (siblings, bits) = tree.path(index);
    let forged = tree.levels[0][index] + Fr::one();

    circuit.assign(tree.root(), forged, &siblings, &bits, true);
    assert!(!circuit.cs.is_satisfied());
    assert!(!circuit.gadget.is_valid(&circuit.cs).expect("assigned"));

    circuit.assign(tree.root(), forged, &siblings, &bits, false);
    assert!(circuit.cs.is_satisfied());
}

#[test]
fn flipped_address_bit_breaks_authentication() {
    let mut rng = StdRng::seed_from_u64(9);
    let tree = Tree::random(&mut rng);
    let mut circuit = auth_circuit();
    let (siblings, mut bits) = tree.path(6);
    bits[1] = !bits[1];

    circuit.assign(tree.root(), tree.levels[0][6], &siblings, &bits, true);
    assert!(!circuit.cs.is_satisfied());
}

#[test]
fn non_boolean_address_is_unsatisfiable() {
    let mut rng = StdRng::seed_from_u64(3);
    let tree = Tree::random(&mut rng);
    let mut circuit = auth_circuit();
    let (siblings, bits) = tree.path(0);
    circuit.assign(tree.root(), tree.levels[0][0], &siblings, &bits, false);
    assert!(circuit.cs.is_satisfied());

    circuit
        .cs
        .set_value(circuit.address[0], Fr::from(2u64))
        .expect("allocated");
    circuit
        .gadget
        .generate_witness(&mut circuit.cs)
        .expect("inputs assigned");
    assert!(!circuit.cs.is_satisfied());
}
