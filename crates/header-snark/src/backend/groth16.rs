//! Groth16 over the MNT4-298 / MNT6-298 cycle.
//!
//! The scalar field of each curve is the base field of the other, so a circuit written over
//! one scalar field verifies proofs of the other curve with native arithmetic. Child proofs
//! are checked in-circuit with the Groth16 verifier gadget: their points are allocated with
//! subgroup checks, their public inputs are fed as little-endian bits and the pairing
//! equation is enforced.
use super::{Backend, RecursiveBackend, VerifierField};
use crate::{
    api::{ProverError, VerificationError},
    PublicWitness,
};
use ark_crypto_primitives::{
    snark::{constraints::SNARKGadget, BooleanInputVar},
    sponge::{poseidon::PoseidonConfig, Absorb},
};
use ark_ec::{pairing::Pairing, CurveGroup};
use ark_ff::{Field, ToConstraintField};
use ark_groth16::{
    constraints::{Groth16VerifierGadget, ProofVar, VerifyingKeyVar},
    Groth16, Proof as Groth16Proof, ProvingKey as Groth16ProvingKey,
    VerifyingKey as Groth16VerifyingKey,
};
use ark_mnt4_298::MNT4_298;
use ark_mnt6_298::MNT6_298;
use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};
use ark_r1cs_std::{
    alloc::{AllocVar, AllocationMode},
    boolean::Boolean,
    eq::EqGadget,
    fields::fp::FpVar,
    pairing::PairingVar,
    ToConstraintFieldGadget,
};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, OptimizationGoal,
    SynthesisError, SynthesisMode,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use ark_std::{end_timer, start_timer};
use header_crypto::{
    limbs::to_limbs, poseidon::poseidon_config, CommitmentEncoding, FingerprintError,
    GroupElement, GroupFamily, VerifyingKeyRecord,
};
use header_gadgets::{GroupElementVar, VerifyingKeyRecordVar};
use once_cell::sync::Lazy;
use rand::{CryptoRng, RngCore};
use std::marker::PhantomData;
use tracing::{debug, error, info, span, Level};

type BasePrimeField<E> = <<<E as Pairing>::G1 as CurveGroup>::BaseField as Field>::BasePrimeField;

/// Fingerprint sponge for MNT4-298 keys, over the MNT4-298 base field
static MNT4_298_KEY_SPONGE: Lazy<PoseidonConfig<ark_mnt4_298::Fq>> =
    Lazy::new(poseidon_config::<ark_mnt4_298::Fq>);

/// Fingerprint sponge for MNT6-298 keys, over the MNT6-298 base field
static MNT6_298_KEY_SPONGE: Lazy<PoseidonConfig<ark_mnt6_298::Fq>> =
    Lazy::new(poseidon_config::<ark_mnt6_298::Fq>);

/// Groth16 over the pairing engine `E`, with circuits over its scalar field
pub struct Groth16Backend<E>(PhantomData<E>);

/// Proves leaves and re-proves aggregates so that they can be folded again
pub type Mnt4Backend = Groth16Backend<MNT4_298>;

/// Proves the folds of two MNT4-298 proofs
pub type Mnt6Backend = Groth16Backend<MNT6_298>;

/// The shape of a circuit, recorded at compile time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledCircuit {
    pub name: &'static str,
    pub num_constraints: usize,
    pub num_public: usize,
    pub num_witness: usize,
    pub domain_size: u64,
}

/// A Groth16 verifying key together with the evaluation domain of its circuit
#[derive(Clone, Debug, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct VerifyingKey<E: Pairing> {
    pub groth16: Groth16VerifyingKey<E>,
    pub domain_size: u64,
    pub domain_generator: E::ScalarField,
    pub commitment_indexes: Vec<u64>,
}

impl<E: Pairing> VerifyingKey<E> {
    /// Number of public inputs the key expects
    pub fn num_public(&self) -> usize {
        self.groth16.gamma_abc_g1.len().saturating_sub(1)
    }
}

/// A Groth16 proving key along with its verifying key
pub struct ProvingKey<E: Pairing> {
    pub groth16: Groth16ProvingKey<E>,
    pub vk: VerifyingKey<E>,
}

pub type Proof<E> = Groth16Proof<E>;

fn domain<F: ark_ff::FftField>(size: usize) -> Result<GeneralEvaluationDomain<F>, SynthesisError> {
    GeneralEvaluationDomain::<F>::new(size).ok_or(SynthesisError::PolynomialDegreeTooLarge)
}

impl<E: Pairing> Backend for Groth16Backend<E>
where
    E::ScalarField: Absorb,
{
    type Field = E::ScalarField;
    type CompiledCircuit = CompiledCircuit;
    type ProvingKey = ProvingKey<E>;
    type VerifyingKey = VerifyingKey<E>;
    type Proof = Proof<E>;

    fn compile<C: ConstraintSynthesizer<E::ScalarField>>(
        name: &'static str,
        circuit: C,
    ) -> Result<CompiledCircuit, ProverError> {
        let span = span!(Level::TRACE, "compile", circuit = name);
        let _enter = span.enter();

        let cs = ConstraintSystem::<E::ScalarField>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        cs.set_mode(SynthesisMode::Setup);
        circuit.generate_constraints(cs.clone())?;
        cs.finalize();

        let num_constraints = cs.num_constraints();
        let num_instance = cs.num_instance_variables();
        let domain_size = domain::<E::ScalarField>(num_constraints + num_instance)?.size() as u64;
        let compiled = CompiledCircuit {
            name,
            num_constraints,
            num_public: num_instance - 1,
            num_witness: cs.num_witness_variables(),
            domain_size,
        };
        info!(
            "compiled {} circuit: {} constraints, {} public inputs, domain of size {}",
            name, compiled.num_constraints, compiled.num_public, compiled.domain_size
        );
        Ok(compiled)
    }

    fn setup<C: ConstraintSynthesizer<E::ScalarField>, R: RngCore + CryptoRng>(
        compiled: &CompiledCircuit,
        circuit: C,
        rng: &mut R,
    ) -> Result<(ProvingKey<E>, VerifyingKey<E>), ProverError> {
        let span = span!(Level::TRACE, "setup", circuit = compiled.name);
        let _enter = span.enter();

        let time = start_timer!(|| format!("{} setup", compiled.name));
        let (pk, groth16_vk) = Groth16::<E>::circuit_specific_setup(circuit, rng)?;
        end_timer!(time);

        let domain = domain::<E::ScalarField>(compiled.domain_size as usize)?;
        let vk = VerifyingKey {
            groth16: groth16_vk,
            domain_size: domain.size() as u64,
            domain_generator: domain.group_gen(),
            commitment_indexes: Vec::new(),
        };
        if vk.num_public() != compiled.num_public {
            return Err(ProverError::Synthesis(SynthesisError::MalformedVerifyingKey));
        }

        Ok((
            ProvingKey {
                groth16: pk,
                vk: vk.clone(),
            },
            vk,
        ))
    }

    fn prove<C: ConstraintSynthesizer<E::ScalarField> + Clone, R: RngCore + CryptoRng>(
        compiled: &CompiledCircuit,
        pk: &ProvingKey<E>,
        assignment: C,
        rng: &mut R,
    ) -> Result<(Proof<E>, PublicWitness<E::ScalarField>), ProverError> {
        let span = span!(Level::TRACE, "prove", circuit = compiled.name);
        let _enter = span.enter();

        let cs = ConstraintSystem::<E::ScalarField>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        assignment.clone().generate_constraints(cs.clone())?;
        if !cs.is_satisfied()? {
            let constraint = cs
                .which_is_unsatisfied()?
                .unwrap_or_else(|| "<unknown>".to_string());
            error!("{} assignment is unsatisfied at {}", compiled.name, constraint);
            return Err(ProverError::Unsatisfied {
                circuit: compiled.name,
                constraint,
            });
        }
        let inputs = {
            let cs = cs.borrow().ok_or(SynthesisError::MissingCS)?;
            cs.instance_assignment[1..].to_vec()
        };
        if inputs.len() != compiled.num_public {
            return Err(ProverError::Synthesis(SynthesisError::MalformedVerifyingKey));
        }
        debug!("{} assignment satisfied, proving", compiled.name);

        let time = start_timer!(|| format!("{} proof", compiled.name));
        let proof = Groth16::<E>::prove(&pk.groth16, assignment, rng)?;
        end_timer!(time);
        Ok((proof, PublicWitness::from(inputs)))
    }

    fn verify(
        vk: &VerifyingKey<E>,
        proof: &Proof<E>,
        witness: &PublicWitness<E::ScalarField>,
    ) -> Result<(), VerificationError> {
        if witness.len() != vk.num_public() {
            return Err(VerificationError::MalformedWitness);
        }
        if Groth16::<E>::verify(&vk.groth16, witness.as_slice(), proof)? {
            Ok(())
        } else {
            Err(VerificationError::VerificationFailed)
        }
    }
}

/// The structural fields of a key whose coordinates are native to the verifier field. The
/// selector commitments (`gamma_abc_g1`) come first, followed by `alpha_g1`, `beta_g2`,
/// `gamma_g2` and `delta_g2`.
fn record<E: Pairing>(
    vk: &VerifyingKey<E>,
    family: GroupFamily,
) -> Result<VerifyingKeyRecord<BasePrimeField<E>>, FingerprintError>
where
    E::G1Affine: ToConstraintField<BasePrimeField<E>>,
    E::G2Affine: ToConstraintField<BasePrimeField<E>>,
{
    if CommitmentEncoding::resolve::<BasePrimeField<E>, BasePrimeField<E>>(family)?
        != CommitmentEncoding::Native
    {
        return Err(FingerprintError::UnsupportedEncoding(
            "recursive keys need native coordinates",
        ));
    }

    let mut commitments = vk
        .groth16
        .gamma_abc_g1
        .iter()
        .map(GroupElement::from_point)
        .collect::<Result<Vec<_>, _>>()?;
    commitments.push(GroupElement::from_point(&vk.groth16.alpha_g1)?);
    commitments.push(GroupElement::from_point(&vk.groth16.beta_g2)?);
    commitments.push(GroupElement::from_point(&vk.groth16.gamma_g2)?);
    commitments.push(GroupElement::from_point(&vk.groth16.delta_g2)?);

    Ok(VerifyingKeyRecord {
        num_public: vk.num_public() as u64,
        domain_size: vk.domain_size,
        generator: to_limbs(&vk.domain_generator),
        commitments,
        commitment_indexes: vk.commitment_indexes.clone(),
    })
}

/// An allocated verifying key: the points consumed by the verifier gadget, and the record
/// absorbed by the fingerprint, whose commitments are read off those same points
pub struct Groth16VerifyingKeyVar<E: Pairing, P: PairingVar<E, BasePrimeField<E>>> {
    pub groth16: VerifyingKeyVar<E, P>,
    pub record: VerifyingKeyRecordVar<BasePrimeField<E>>,
}

fn new_verifying_key_var<E, P>(
    cs: ConstraintSystemRef<BasePrimeField<E>>,
    vk: &VerifyingKey<E>,
    mode: AllocationMode,
) -> Result<Groth16VerifyingKeyVar<E, P>, SynthesisError>
where
    E: Pairing,
    P: PairingVar<E, BasePrimeField<E>>,
    P::G1Var: ToConstraintFieldGadget<BasePrimeField<E>>,
    P::G2Var: ToConstraintFieldGadget<BasePrimeField<E>>,
{
    let groth16 = <Groth16VerifierGadget<E, P> as SNARKGadget<
        E::ScalarField,
        BasePrimeField<E>,
        Groth16<E>,
    >>::new_verification_key_unchecked(cs.clone(), || Ok(&vk.groth16), mode)?;

    let mut commitments = groth16
        .gamma_abc_g1
        .iter()
        .map(GroupElementVar::from_point)
        .collect::<Result<Vec<_>, _>>()?;
    commitments.push(GroupElementVar::from_point(&groth16.alpha_g1)?);
    commitments.push(GroupElementVar::from_point(&groth16.beta_g2)?);
    commitments.push(GroupElementVar::from_point(&groth16.gamma_g2)?);
    commitments.push(GroupElementVar::from_point(&groth16.delta_g2)?);

    let alloc = |value: u64| {
        FpVar::<BasePrimeField<E>>::new_variable(
            cs.clone(),
            || Ok(<BasePrimeField<E>>::from(value)),
            mode,
        )
    };
    let record = VerifyingKeyRecordVar {
        num_public: alloc(vk.num_public() as u64)?,
        domain_size: alloc(vk.domain_size)?,
        generator: to_limbs(&vk.domain_generator)
            .into_iter()
            .map(&alloc)
            .collect::<Result<_, _>>()?,
        commitments,
        commitment_indexes: vk
            .commitment_indexes
            .iter()
            .map(|i| alloc(*i))
            .collect::<Result<_, _>>()?,
    };

    Ok(Groth16VerifyingKeyVar { groth16, record })
}

fn enforce_verify<E, P>(
    vk: &Groth16VerifyingKeyVar<E, P>,
    proof: &ProofVar<E, P>,
    inputs: Vec<Vec<Boolean<BasePrimeField<E>>>>,
) -> Result<(), SynthesisError>
where
    E: Pairing,
    P: PairingVar<E, BasePrimeField<E>>,
{
    let span = span!(Level::TRACE, "enforce_verify");
    let _enter = span.enter();

    if inputs.len() + 1 != vk.groth16.gamma_abc_g1.len() {
        error!(
            "key expects {} public inputs, got {}",
            vk.groth16.gamma_abc_g1.len().saturating_sub(1),
            inputs.len()
        );
        return Err(SynthesisError::MalformedVerifyingKey);
    }
    let inputs = BooleanInputVar::new(inputs);
    <Groth16VerifierGadget<E, P> as SNARKGadget<E::ScalarField, BasePrimeField<E>, Groth16<E>>>::verify(
        &vk.groth16,
        &inputs,
        proof,
    )?
    .enforce_equal(&Boolean::TRUE)
}

macro_rules! impl_recursive_backend {
    ($engine:ty, $verifier:ty, $pairing_var:ty, $family:expr, $sponge:ident) => {
        impl RecursiveBackend for Groth16Backend<$engine> {
            type Verifier = Groth16Backend<$verifier>;
            type VerifyingKeyVar = Groth16VerifyingKeyVar<$engine, $pairing_var>;
            type ProofVar = ProofVar<$engine, $pairing_var>;

            fn sponge_config() -> &'static PoseidonConfig<VerifierField<Self>> {
                &*$sponge
            }

            fn record(
                vk: &VerifyingKey<$engine>,
            ) -> Result<VerifyingKeyRecord<VerifierField<Self>>, FingerprintError> {
                record::<$engine>(vk, $family)
            }

            fn new_verifying_key_var(
                cs: ConstraintSystemRef<VerifierField<Self>>,
                vk: &VerifyingKey<$engine>,
                mode: AllocationMode,
            ) -> Result<Self::VerifyingKeyVar, SynthesisError> {
                new_verifying_key_var::<$engine, $pairing_var>(cs, vk, mode)
            }

            fn new_proof_var(
                cs: ConstraintSystemRef<VerifierField<Self>>,
                proof: &Proof<$engine>,
            ) -> Result<Self::ProofVar, SynthesisError> {
                ProofVar::new_witness(cs, || Ok(proof))
            }

            fn fingerprint_var(
                vk: &Self::VerifyingKeyVar,
            ) -> Result<FpVar<VerifierField<Self>>, SynthesisError> {
                vk.record.fingerprint(Self::sponge_config())
            }

            fn enforce_verify(
                vk: &Self::VerifyingKeyVar,
                proof: &Self::ProofVar,
                inputs: Vec<Vec<Boolean<VerifierField<Self>>>>,
            ) -> Result<(), SynthesisError> {
                enforce_verify(vk, proof, inputs)
            }

            fn placeholder_proof() -> Proof<$engine> {
                Proof::default()
            }
        }
    };
}

impl_recursive_backend!(
    MNT4_298,
    MNT6_298,
    ark_mnt4_298::constraints::PairingVar,
    GroupFamily::Mnt4_298,
    MNT4_298_KEY_SPONGE
);
impl_recursive_backend!(
    MNT6_298,
    MNT4_298,
    ark_mnt6_298::constraints::PairingVar,
    GroupFamily::Mnt6_298,
    MNT6_298_KEY_SPONGE
);
