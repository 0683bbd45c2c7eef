//! The argument system behind the protocol. Circuits only see the capabilities below: an
//! off-circuit compile/setup/prove/verify cycle, and an in-circuit verifier for the proofs of
//! a partner backend whose scalar field is this backend's base field.
use crate::{api::ProverError, api::VerificationError, PublicWitness};
use ark_crypto_primitives::sponge::{poseidon::PoseidonConfig, Absorb};
use ark_ff::PrimeField;
use ark_r1cs_std::{alloc::AllocationMode, boolean::Boolean, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use header_crypto::{Fingerprint, FingerprintError, VerifyingKeyRecord};
use rand::{CryptoRng, RngCore};

mod groth16;
pub use groth16::{
    CompiledCircuit, Groth16Backend, Groth16VerifyingKeyVar, Mnt4Backend, Mnt6Backend, Proof,
    ProvingKey, VerifyingKey,
};

/// The field a backend's proofs are verified over
pub type VerifierField<B> = <<B as RecursiveBackend>::Verifier as Backend>::Field;

/// Off-circuit operations of a zero-knowledge argument
pub trait Backend {
    /// The scalar field the circuits are written over
    type Field: PrimeField + Absorb;
    type CompiledCircuit: Clone + Send + Sync;
    type ProvingKey: Send + Sync;
    type VerifyingKey: Clone + Send + Sync;
    type Proof: Clone + Send + Sync;

    /// Synthesizes `circuit` in setup mode and records its shape
    fn compile<C: ConstraintSynthesizer<Self::Field>>(
        name: &'static str,
        circuit: C,
    ) -> Result<Self::CompiledCircuit, ProverError>;

    /// Generates the keys of a compiled circuit
    fn setup<C: ConstraintSynthesizer<Self::Field>, R: RngCore + CryptoRng>(
        compiled: &Self::CompiledCircuit,
        circuit: C,
        rng: &mut R,
    ) -> Result<(Self::ProvingKey, Self::VerifyingKey), ProverError>;

    /// Proves a full assignment, returning the proof and its public witness. Unsatisfied
    /// assignments are refused.
    fn prove<C: ConstraintSynthesizer<Self::Field> + Clone, R: RngCore + CryptoRng>(
        compiled: &Self::CompiledCircuit,
        pk: &Self::ProvingKey,
        assignment: C,
        rng: &mut R,
    ) -> Result<(Self::Proof, PublicWitness<Self::Field>), ProverError>;

    fn verify(
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        witness: &PublicWitness<Self::Field>,
    ) -> Result<(), VerificationError>;
}

/// A backend whose proofs can be verified inside the circuits of its partner. The two form a
/// cycle: each one's scalar field is the other's base field.
pub trait RecursiveBackend: Backend {
    /// The backend whose circuits verify this backend's proofs
    type Verifier: RecursiveBackend<Verifier = Self>;
    type VerifyingKeyVar;
    type ProofVar;

    /// Sponge parameters of fingerprints, over the field of the key's coordinates
    fn sponge_config() -> &'static PoseidonConfig<VerifierField<Self>>;

    /// The structural fields absorbed by the fingerprint
    fn record(
        vk: &Self::VerifyingKey,
    ) -> Result<VerifyingKeyRecord<VerifierField<Self>>, FingerprintError>;

    /// The fingerprint of a verifying key, as carried in public witnesses
    fn fingerprint(vk: &Self::VerifyingKey) -> Result<Fingerprint<Self::Field>, FingerprintError> {
        Self::record(vk)?.fingerprint(Self::sponge_config()).cast()
    }

    /// Allocates a verifying key along with its structural record. Points are not subgroup
    /// checked; a witness key is pinned by its fingerprint instead.
    fn new_verifying_key_var(
        cs: ConstraintSystemRef<VerifierField<Self>>,
        vk: &Self::VerifyingKey,
        mode: AllocationMode,
    ) -> Result<Self::VerifyingKeyVar, SynthesisError>;

    /// Allocates a proof as a witness, checking that its points lie in the prime order
    /// subgroups
    fn new_proof_var(
        cs: ConstraintSystemRef<VerifierField<Self>>,
        proof: &Self::Proof,
    ) -> Result<Self::ProofVar, SynthesisError>;

    /// Computes the fingerprint of an allocated verifying key
    fn fingerprint_var(
        vk: &Self::VerifyingKeyVar,
    ) -> Result<FpVar<VerifierField<Self>>, SynthesisError>;

    /// Enforces that `proof` verifies under `vk` for the given public inputs, each one as
    /// little-endian bits
    fn enforce_verify(
        vk: &Self::VerifyingKeyVar,
        proof: &Self::ProofVar,
        inputs: Vec<Vec<Boolean<VerifierField<Self>>>>,
    ) -> Result<(), SynthesisError>;

    /// A well-formed proof used to shape circuits at setup time
    fn placeholder_proof() -> Self::Proof;
}
