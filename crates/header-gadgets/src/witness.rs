use crate::{
    emulated::{canonicalize, le_bits, EmulatedVar},
    hash::HashVar,
};
use ark_ff::PrimeField;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar};
use ark_relations::r1cs::{Namespace, SynthesisError};
use header_crypto::{
    limbs::to_limbs, PrimeFieldLimbs, BEGIN_HASH_OFFSET, END_HASH_OFFSET, FINGERPRINT_OFFSET,
    HASH_LEN, NUM_PUBLIC_INPUTS, SAFE_SCALAR_BITS,
};

/// The public witness of a child proof. Its elements live in the child's scalar field, which
/// is emulated in the parent circuit.
#[derive(Clone, Debug)]
pub struct PublicWitnessVar<F: PrimeField> {
    pub elements: Vec<EmulatedVar<F>>,
}

impl<F: PrimeField> PublicWitnessVar<F> {
    /// Allocates the `NUM_PUBLIC_INPUTS` elements of a witness over the scalar field `FR`
    pub fn new_witness<FR: PrimeField>(
        cs: impl Into<Namespace<F>>,
        f: impl FnOnce() -> Result<Vec<FR>, SynthesisError>,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let values = match f() {
            Ok(values) if values.len() == NUM_PUBLIC_INPUTS => Some(values),
            Ok(_) => return Err(SynthesisError::Unsatisfiable),
            Err(SynthesisError::AssignmentMissing) => None,
            Err(e) => return Err(e),
        };

        let elements = (0..NUM_PUBLIC_INPUTS)
            .map(|i| {
                let limbs = values
                    .as_ref()
                    .map(|v| to_limbs(&v[i]))
                    .ok_or(SynthesisError::AssignmentMissing);
                EmulatedVar::new_witness::<PrimeFieldLimbs<FR>>(cs.clone(), || limbs)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { elements })
    }

    fn hash_at(&self, offset: usize) -> Result<HashVar<F>, SynthesisError> {
        let bytes = self.elements[offset..offset + HASH_LEN]
            .iter()
            .map(|element| canonicalize(element, Some(8)))
            .collect::<Result<Vec<_>, _>>()?;
        HashVar::from_elements(bytes)
    }

    /// The begin hash claimed by the child
    pub fn begin_hash(&self) -> Result<HashVar<F>, SynthesisError> {
        self.hash_at(BEGIN_HASH_OFFSET)
    }

    /// The end hash claimed by the child
    pub fn end_hash(&self) -> Result<HashVar<F>, SynthesisError> {
        self.hash_at(END_HASH_OFFSET)
    }

    /// The verifying key fingerprint claimed by the child
    pub fn fingerprint(&self) -> Result<FpVar<F>, SynthesisError> {
        canonicalize(&self.elements[FINGERPRINT_OFFSET], Some(SAFE_SCALAR_BITS))
    }

    /// The public inputs as little-endian bits, the form consumed by an in-circuit verifier:
    /// eight bits per hash byte and `SAFE_SCALAR_BITS` for the fingerprint
    pub fn input_bits(&self) -> Result<Vec<Vec<Boolean<F>>>, SynthesisError> {
        let mut inputs = Vec::with_capacity(NUM_PUBLIC_INPUTS);
        for byte in &self.elements[BEGIN_HASH_OFFSET..END_HASH_OFFSET + HASH_LEN] {
            inputs.push(le_bits(&canonicalize(byte, Some(8))?, 8)?);
        }
        inputs.push(le_bits(&self.fingerprint()?, SAFE_SCALAR_BITS)?);
        Ok(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::{print_unsatisfied_constraints, run_profile_constraints};
    use ark_bn254::Fr;
    use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::FieldVar, R1CSVar};
    use ark_relations::r1cs::ConstraintSystem;
    use header_crypto::Hash;

    fn witness(begin: u8, end: u8, fingerprint: u64) -> Vec<Fr> {
        let mut values = vec![Fr::from(begin as u64); HASH_LEN];
        values.extend(vec![Fr::from(end as u64); HASH_LEN]);
        values.push(Fr::from(fingerprint));
        values
    }

    #[test]
    fn reads_fixed_offsets() {
        run_profile_constraints(|| {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let values = witness(3, 7, 99);
            let var = PublicWitnessVar::new_witness(cs.clone(), || Ok(values.clone())).unwrap();

            let begin = HashVar::new_witness(cs.clone(), || Ok(Hash([3; HASH_LEN]))).unwrap();
            let end = HashVar::new_witness(cs.clone(), || Ok(Hash([7; HASH_LEN]))).unwrap();
            var.begin_hash().unwrap().enforce_equal(&begin).unwrap();
            var.end_hash().unwrap().enforce_equal(&end).unwrap();
            var.fingerprint()
                .unwrap()
                .enforce_equal(&FpVar::constant(Fr::from(99u64)))
                .unwrap();

            let bits = var.input_bits().unwrap();
            assert_eq!(bits.len(), NUM_PUBLIC_INPUTS);
            assert_eq!(
                bits[0].value().unwrap(),
                vec![true, true, false, false, false, false, false, false]
            );
            assert_eq!(bits[HASH_LEN].value().unwrap()[..3], [true, true, true]);
            let fingerprint = Boolean::le_bits_to_fp_var(&bits[FINGERPRINT_OFFSET]).unwrap();
            assert_eq!(fingerprint.value().unwrap(), values[FINGERPRINT_OFFSET]);

            print_unsatisfied_constraints(cs.clone());
            assert!(cs.is_satisfied().unwrap());
        });
    }

    #[test]
    fn wide_byte_elements_are_unsatisfiable() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let mut values = witness(1, 2, 3);
        values[0] = Fr::from(1u64 << 40) * Fr::from(1u64 << 40);
        let var = PublicWitnessVar::new_witness(cs.clone(), || Ok(values)).unwrap();
        var.begin_hash().unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn wrong_length_is_rejected() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let result = PublicWitnessVar::new_witness(cs, || Ok(vec![Fr::from(0u64); 3]));
        assert!(result.is_err());
    }

    #[test]
    fn oversized_fingerprints_are_unsatisfiable() {
        use ark_bls12_377::Fq as Fq377;
        use ark_ff::Field;

        let cs = ConstraintSystem::<Fr>::new_ref();
        let mut values = vec![Fq377::from(1u64); NUM_PUBLIC_INPUTS];
        values[FINGERPRINT_OFFSET] = Fq377::from(2u64).pow([300u64]);
        let var = PublicWitnessVar::new_witness(cs.clone(), || Ok(values)).unwrap();
        var.fingerprint().unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
