//! # Leaf Transition Circuit
//!
//! Proves knowledge of a header which embeds the begin hash as its parent and whose double
//! SHA-256 is the end hash.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use header_crypto::{Hash, RawHeader, HASH_LEN, HEADER_LEN, PARENT_HASH_OFFSET};
use header_gadgets::{double_sha256, HashVar};
use tracing::{debug, info, span, Level};

#[derive(Clone, Debug)]
/// A single header transition `begin -> end`. The fingerprint slot is public but left
/// unconstrained so that leaves share the public witness layout of aggregators.
pub struct LeafTransition<F: PrimeField> {
    pub header: Option<RawHeader>,
    pub begin: Option<Hash>,
    pub end: Option<Hash>,
    pub fingerprint: Option<F>,
}

impl<F: PrimeField> LeafTransition<F> {
    /// Initializes an empty transition. This is used when running the trusted setup.
    pub fn empty() -> Self {
        Self {
            header: None,
            begin: None,
            end: None,
            fingerprint: None,
        }
    }

    /// The honest transition of `header`, from its parent hash to its own hash
    pub fn new(header: &RawHeader, fingerprint: F) -> Self {
        Self {
            header: Some(*header),
            begin: Some(header.parent_hash()),
            end: Some(header.hash()),
            fingerprint: Some(fingerprint),
        }
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for LeafTransition<F> {
    #[tracing::instrument(target = "r1cs")]
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let span = span!(Level::TRACE, "LeafTransition");
        let _enter = span.enter();
        info!("generating constraints");

        let begin = HashVar::new_input(cs.clone(), || {
            self.begin.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let end = HashVar::new_input(cs.clone(), || {
            self.end.ok_or(SynthesisError::AssignmentMissing)
        })?;
        // fingerprint slot, intentionally unconstrained
        let _fingerprint = FpVar::new_input(cs.clone(), || {
            self.fingerprint.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let header_values = match self.header {
            Some(header) => header.0.iter().map(|b| Some(*b)).collect::<Vec<_>>(),
            None => vec![None; HEADER_LEN],
        };
        let header = UInt8::new_witness_vec(cs, &header_values)?;

        debug!("checking the parent hash");
        let parent = HashVar::from_bytes(&header[PARENT_HASH_OFFSET..PARENT_HASH_OFFSET + HASH_LEN])?;
        parent.enforce_equal(&begin)?;

        debug!("checking the header hash");
        let digest = HashVar::from_bytes(&double_sha256(&header)?)?;
        digest.enforce_equal(&end)?;

        info!("constraints generated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field as Fr;
    use ark_relations::r1cs::ConstraintSystem;
    use header_crypto::NUM_PUBLIC_INPUTS;
    use header_gadgets::utils::test_helpers::{
        print_unsatisfied_constraints, run_profile_constraints,
    };

    const HEADER: &str = "010000003c668f799ca5472fd05b8d43c574469fbec46ae3ffec010cdf6ee31100000000a97c6e691b813753248aa4614e4d3a34a3d1471e6ad863a392ccf4687d857a30f92b6f49ffff001d22239e3b";

    fn synthesize(circuit: LeafTransition<Fr>) -> ConstraintSystemRef<Fr> {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs
    }

    #[test]
    fn honest_transition_is_satisfied() {
        run_profile_constraints(|| {
            let header = RawHeader::from_hex(HEADER).unwrap();
            let cs = synthesize(LeafTransition::new(&header, Fr::from(0u64)));
            print_unsatisfied_constraints(cs.clone());
            assert!(cs.is_satisfied().unwrap());
            assert_eq!(cs.num_instance_variables(), 1 + NUM_PUBLIC_INPUTS);
        });
    }

    #[test]
    fn fingerprint_slot_is_free() {
        let header = RawHeader::from_hex(HEADER).unwrap();
        let cs = synthesize(LeafTransition::new(&header, Fr::from(987_654_321u64)));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn wrong_begin_hash_is_unsatisfied() {
        run_profile_constraints(|| {
            let header = RawHeader::from_hex(HEADER).unwrap();
            let mut circuit = LeafTransition::new(&header, Fr::from(0u64));
            let mut begin = header.parent_hash();
            begin.0[0] ^= 0xff;
            circuit.begin = Some(begin);
            assert!(!synthesize(circuit).is_satisfied().unwrap());
        });
    }

    #[test]
    fn wrong_end_hash_is_unsatisfied() {
        run_profile_constraints(|| {
            let header = RawHeader::from_hex(HEADER).unwrap();
            let mut circuit = LeafTransition::new(&header, Fr::from(0u64));
            circuit.end = Some(header.parent_hash());
            assert!(!synthesize(circuit).is_satisfied().unwrap());
        });
    }

    #[test]
    fn tampered_header_is_unsatisfied() {
        let header = RawHeader::from_hex(HEADER).unwrap();
        let mut circuit = LeafTransition::new(&header, Fr::from(0u64));
        let mut tampered = header;
        tampered.0[HEADER_LEN - 1] ^= 1;
        circuit.header = Some(tampered);
        assert!(!synthesize(circuit).is_satisfied().unwrap());
    }
}
