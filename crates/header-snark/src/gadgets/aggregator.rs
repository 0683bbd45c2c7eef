//! # Recursive Aggregator Circuit
//!
//! Folds two child proofs covering `begin -> relay` and `relay -> end` into one proof of
//! `begin -> end`. The second child must always be a leaf. The first child is either a leaf or
//! an earlier aggregate, identified by the aggregator's own fingerprint which is a public
//! input.
//!
//! Folding takes two circuits. [`Aggregator`] is written over the base field of the children's
//! curve, where their pairing equations are native, and so produces a proof on the partner
//! curve. [`Wrapper`] verifies that proof back on the children's curve and republishes its
//! public inputs, so that the result can be folded again. The wrapper's key is the key of the
//! aggregator as a whole.

use crate::{
    backend::{Backend, RecursiveBackend, VerifierField},
    PublicWitness,
};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use header_crypto::{Fingerprint, Hash, NUM_PUBLIC_INPUTS, SAFE_SCALAR_BITS};
use header_gadgets::{le_bits, HashVar, PublicWitnessVar};
use tracing::{debug, error, info, span, Level};

/// A proof together with the key it verifies under and its public witness
pub struct ChildProof<B: RecursiveBackend> {
    pub vk: B::VerifyingKey,
    pub proof: B::Proof,
    pub witness: PublicWitness<B::Field>,
}

impl<B: RecursiveBackend> Clone for ChildProof<B> {
    fn clone(&self) -> Self {
        Self {
            vk: self.vk.clone(),
            proof: self.proof.clone(),
            witness: self.witness.clone(),
        }
    }
}

impl<B: RecursiveBackend> ChildProof<B> {
    /// A well-formed child under `vk`, used to shape the circuit at setup time
    pub fn placeholder(vk: &B::VerifyingKey) -> Self {
        Self {
            vk: vk.clone(),
            proof: B::placeholder_proof(),
            witness: PublicWitness::from(vec![B::Field::from(0u64); NUM_PUBLIC_INPUTS]),
        }
    }
}

/// Moves a fingerprint into the field of the circuit consuming it
fn cast<B: RecursiveBackend>(
    fingerprint: &Fingerprint<B::Field>,
) -> Result<VerifierField<B>, SynthesisError> {
    fingerprint
        .cast::<VerifierField<B>>()
        .map(|f| f.scalar())
        .map_err(|e| {
            error!("fingerprint does not fit the verifier field: {}", e);
            SynthesisError::Unsatisfiable
        })
}

/// Both children and the hashes stitching them together. The leaf fingerprint is a circuit
/// constant, the aggregator's own fingerprint a public input.
pub struct Aggregator<B: RecursiveBackend> {
    pub leaf_fingerprint: Fingerprint<B::Field>,
    pub self_fingerprint: Option<Fingerprint<B::Field>>,
    pub begin: Option<Hash>,
    pub relay: Option<Hash>,
    pub end: Option<Hash>,
    pub first: ChildProof<B>,
    pub second: ChildProof<B>,
}

impl<B: RecursiveBackend> Clone for Aggregator<B> {
    fn clone(&self) -> Self {
        Self {
            leaf_fingerprint: self.leaf_fingerprint,
            self_fingerprint: self.self_fingerprint,
            begin: self.begin,
            relay: self.relay,
            end: self.end,
            first: self.first.clone(),
            second: self.second.clone(),
        }
    }
}

impl<B: RecursiveBackend> Aggregator<B> {
    /// Initializes an aggregator with no assignment, shaped after the leaf verifying key. This
    /// is used when running the trusted setup.
    pub fn empty(leaf_fingerprint: Fingerprint<B::Field>, leaf_vk: &B::VerifyingKey) -> Self {
        Self {
            leaf_fingerprint,
            self_fingerprint: None,
            begin: None,
            relay: None,
            end: None,
            first: ChildProof::placeholder(leaf_vk),
            second: ChildProof::placeholder(leaf_vk),
        }
    }
}

impl<B: RecursiveBackend> ConstraintSynthesizer<VerifierField<B>> for Aggregator<B> {
    #[tracing::instrument(target = "r1cs", skip(self))]
    fn generate_constraints(
        self,
        cs: ConstraintSystemRef<VerifierField<B>>,
    ) -> Result<(), SynthesisError> {
        let span = span!(Level::TRACE, "Aggregator");
        let _enter = span.enter();
        info!("generating constraints");

        // public inputs, in witness layout order
        let begin = HashVar::new_input(cs.clone(), || {
            self.begin.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let end = HashVar::new_input(cs.clone(), || {
            self.end.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let self_fingerprint = FpVar::new_input(cs.clone(), || {
            self.self_fingerprint
                .as_ref()
                .ok_or(SynthesisError::AssignmentMissing)
                .and_then(cast::<B>)
        })?;

        let relay = HashVar::new_bytes_witness(cs.clone(), self.relay)?;
        let leaf_fingerprint = FpVar::constant(cast::<B>(&self.leaf_fingerprint)?);

        let (first_vk, first_proof, first_witness) = allocate_child(cs.clone(), &self.first)?;
        let (second_vk, second_proof, second_witness) = allocate_child(cs, &self.second)?;

        debug!("fingerprinting child verifying keys");
        let first_fingerprint = B::fingerprint_var(&first_vk)?;
        let second_fingerprint = B::fingerprint_var(&second_vk)?;

        debug!("checking the first child's claimed fingerprint");
        first_witness
            .fingerprint()?
            .enforce_equal(&first_fingerprint)?;

        debug!("checking which keys are admissible");
        let first_is_leaf = first_fingerprint.is_eq(&leaf_fingerprint)?;
        let first_is_self = first_fingerprint.is_eq(&self_fingerprint)?;
        (FpVar::from(first_is_leaf) + FpVar::from(first_is_self)).enforce_equal(&FpVar::one())?;
        second_fingerprint.enforce_equal(&leaf_fingerprint)?;

        debug!("verifying child proofs");
        B::enforce_verify(&first_vk, &first_proof, first_witness.input_bits()?)?;
        B::enforce_verify(&second_vk, &second_proof, second_witness.input_bits()?)?;

        debug!("checking hash continuity");
        first_witness.begin_hash()?.enforce_equal(&begin)?;
        first_witness.end_hash()?.enforce_equal(&relay)?;
        second_witness.begin_hash()?.enforce_equal(&relay)?;
        second_witness.end_hash()?.enforce_equal(&end)?;

        info!("constraints generated");
        Ok(())
    }
}

#[allow(clippy::type_complexity)]
fn allocate_child<B: RecursiveBackend>(
    cs: ConstraintSystemRef<VerifierField<B>>,
    child: &ChildProof<B>,
) -> Result<(B::VerifyingKeyVar, B::ProofVar, PublicWitnessVar<VerifierField<B>>), SynthesisError>
{
    let vk = B::new_verifying_key_var(cs.clone(), &child.vk, AllocationMode::Witness)?;
    let proof = B::new_proof_var(cs.clone(), &child.proof)?;
    let witness =
        PublicWitnessVar::new_witness::<B::Field>(cs, || Ok(child.witness.as_slice().to_vec()))?;
    Ok((vk, proof, witness))
}

/// Verifies an [`Aggregator`] proof, whose key is a circuit constant, and republishes its
/// public inputs on the children's curve
pub struct Wrapper<B: RecursiveBackend> {
    pub vk: <B::Verifier as Backend>::VerifyingKey,
    pub proof: <B::Verifier as Backend>::Proof,
    pub begin: Option<Hash>,
    pub end: Option<Hash>,
    pub fingerprint: Option<Fingerprint<B::Field>>,
}

impl<B: RecursiveBackend> Clone for Wrapper<B> {
    fn clone(&self) -> Self {
        Self {
            vk: self.vk.clone(),
            proof: self.proof.clone(),
            begin: self.begin,
            end: self.end,
            fingerprint: self.fingerprint,
        }
    }
}

impl<B: RecursiveBackend> Wrapper<B> {
    /// Initializes a wrapper around the aggregator key `vk` with no assignment. This is used
    /// when running the trusted setup.
    pub fn empty(vk: <B::Verifier as Backend>::VerifyingKey) -> Self {
        Self {
            vk,
            proof: B::Verifier::placeholder_proof(),
            begin: None,
            end: None,
            fingerprint: None,
        }
    }
}

impl<B: RecursiveBackend> ConstraintSynthesizer<B::Field> for Wrapper<B> {
    #[tracing::instrument(target = "r1cs", skip(self))]
    fn generate_constraints(self, cs: ConstraintSystemRef<B::Field>) -> Result<(), SynthesisError> {
        let span = span!(Level::TRACE, "Wrapper");
        let _enter = span.enter();
        info!("generating constraints");

        let begin = HashVar::new_input(cs.clone(), || {
            self.begin.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let end = HashVar::new_input(cs.clone(), || {
            self.end.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let fingerprint = FpVar::new_input(cs.clone(), || {
            self.fingerprint
                .map(|f| f.scalar())
                .ok_or(SynthesisError::AssignmentMissing)
        })?;

        debug!("decomposing public inputs");
        let mut inputs = Vec::with_capacity(NUM_PUBLIC_INPUTS);
        for byte in begin.0.iter().chain(&end.0) {
            inputs.push(le_bits(byte, 8)?);
        }
        inputs.push(le_bits(&fingerprint, SAFE_SCALAR_BITS)?);

        debug!("verifying the aggregator proof");
        let vk = B::Verifier::new_verifying_key_var(cs.clone(), &self.vk, AllocationMode::Constant)?;
        let proof = B::Verifier::new_proof_var(cs, &self.proof)?;
        B::Verifier::enforce_verify(&vk, &proof, inputs)?;

        info!("constraints generated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::Mnt4Backend,
        gadgets::LeafTransition,
        Field,
    };
    use ark_relations::r1cs::ConstraintSystem;
    use header_crypto::{RawHeader, HEADER_LEN};
    use rand::{rngs::StdRng, SeedableRng};

    type Fq = VerifierField<Mnt4Backend>;

    #[test]
    fn aggregator_exposes_the_shared_layout() {
        let rng = &mut StdRng::seed_from_u64(0);
        let compiled = Mnt4Backend::compile("leaf", LeafTransition::<Field>::empty()).unwrap();
        let (_, vk) = Mnt4Backend::setup(&compiled, LeafTransition::<Field>::empty(), rng).unwrap();
        let fingerprint = Mnt4Backend::fingerprint(&vk).unwrap();

        let cs = ConstraintSystem::<Fq>::new_ref();
        cs.set_mode(ark_relations::r1cs::SynthesisMode::Setup);
        Aggregator::<Mnt4Backend>::empty(fingerprint, &vk)
            .generate_constraints(cs.clone())
            .unwrap();
        cs.finalize();
        // begin, end and the aggregator's own fingerprint
        assert_eq!(cs.num_instance_variables(), 1 + NUM_PUBLIC_INPUTS);
    }

    #[test]
    fn placeholder_children_do_not_satisfy_the_aggregator() {
        let rng = &mut StdRng::seed_from_u64(1);
        let compiled = Mnt4Backend::compile("leaf", LeafTransition::<Field>::empty()).unwrap();
        let (_, vk) = Mnt4Backend::setup(&compiled, LeafTransition::<Field>::empty(), rng).unwrap();
        let fingerprint = Mnt4Backend::fingerprint(&vk).unwrap();

        let header = RawHeader([0; HEADER_LEN]);
        let mut circuit = Aggregator::<Mnt4Backend>::empty(fingerprint, &vk);
        circuit.self_fingerprint = Some(fingerprint);
        circuit.begin = Some(header.parent_hash());
        circuit.relay = Some(header.hash());
        circuit.end = Some(header.hash());

        let cs = ConstraintSystem::<Fq>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
