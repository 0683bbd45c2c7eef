use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{
    alloc::{AllocVar, AllocationMode},
    boolean::Boolean,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
    R1CSVar, ToBitsGadget,
};
use ark_relations::r1cs::{Namespace, SynthesisError};
use header_crypto::{limbs::effective_limbs, EmulatedParams, SAFE_SCALAR_BITS};
use tracing::{debug, span, Level};

/// An element of a foreign field, carried as little-endian limbs of the native field.
/// Every allocated limb is range checked to `bits_per_limb` bits.
#[derive(Clone, Debug)]
pub struct EmulatedVar<F: PrimeField> {
    pub limbs: Vec<FpVar<F>>,
    pub bits_per_limb: usize,
    pub modulus_bits: usize,
}

impl<F: PrimeField> EmulatedVar<F> {
    /// Allocates an element described by `P` from its limbs
    pub fn new_variable<P: EmulatedParams>(
        cs: impl Into<Namespace<F>>,
        f: impl FnOnce() -> Result<Vec<u64>, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let num_limbs = P::num_limbs();

        let values = match f() {
            Ok(limbs) if limbs.len() == num_limbs => Some(limbs),
            Ok(_) => return Err(SynthesisError::Unsatisfiable),
            Err(SynthesisError::AssignmentMissing) => None,
            Err(e) => return Err(e),
        };

        let limbs = (0..num_limbs)
            .map(|i| {
                let value = values
                    .as_ref()
                    .map(|limbs| F::from(limbs[i]))
                    .ok_or(SynthesisError::AssignmentMissing);
                let limb = FpVar::new_variable(cs.clone(), || value, mode)?;
                enforce_bit_length(&limb, P::BITS_PER_LIMB)?;
                Ok(limb)
            })
            .collect::<Result<Vec<_>, SynthesisError>>()?;

        Ok(Self {
            limbs,
            bits_per_limb: P::BITS_PER_LIMB,
            modulus_bits: P::modulus_bits(),
        })
    }

    pub fn new_witness<P: EmulatedParams>(
        cs: impl Into<Namespace<F>>,
        f: impl FnOnce() -> Result<Vec<u64>, SynthesisError>,
    ) -> Result<Self, SynthesisError> {
        Self::new_variable::<P>(cs, f, AllocationMode::Witness)
    }

    /// The limb values, if assigned
    pub fn value(&self) -> Result<Vec<u64>, SynthesisError> {
        self.limbs
            .iter()
            .map(|limb| {
                let value = limb.value()?.into_bigint();
                Ok(value.as_ref()[0])
            })
            .collect()
    }
}

/// Enforces that `x` fits in `bits` bits. Every element fits when `bits` reaches the native
/// modulus size.
pub fn enforce_bit_length<F: PrimeField>(x: &FpVar<F>, bits: usize) -> Result<(), SynthesisError> {
    if bits >= F::MODULUS_BIT_SIZE as usize {
        return Ok(());
    }
    le_bits(x, bits).map(|_| ())
}

/// Decomposes `x` into `bits` little-endian bits, enforcing that it fits. Constants are
/// decomposed directly.
pub fn le_bits<F: PrimeField>(x: &FpVar<F>, bits: usize) -> Result<Vec<Boolean<F>>, SynthesisError> {
    if bits >= F::MODULUS_BIT_SIZE as usize {
        let mut out = x.to_bits_le()?;
        out.truncate(bits);
        return Ok(out);
    }

    let cs = x.cs();
    if cs.is_none() {
        let value = x.value()?.into_bigint();
        if value.num_bits() as usize > bits {
            return Err(SynthesisError::Unsatisfiable);
        }
        return Ok(value.to_bits_le()[..bits]
            .iter()
            .map(|b| Boolean::constant(*b))
            .collect());
    }

    let native_bits = x.value().ok().map(|v| v.into_bigint().to_bits_le());
    let bit_vars = (0..bits)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                native_bits
                    .as_ref()
                    .map(|b| b[i])
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Boolean::le_bits_to_fp_var(&bit_vars)?.enforce_equal(x)?;
    Ok(bit_vars)
}

/// Recomposes an emulated element into one native scalar.
///
/// Limbs are combined with Horner's rule, most significant first, using `2^bits_per_limb` as
/// the multiplier. Only the limbs needed to hold `max_bits` bits (the emulated modulus width
/// by default) take part and every limb past them must be zero. The composed value is range
/// checked to `max_bits`, or to `SAFE_SCALAR_BITS` when the emulated modulus is wider, unless
/// the limbs cannot exceed that width anyway.
pub fn canonicalize<F: PrimeField>(
    element: &EmulatedVar<F>,
    max_bits: Option<usize>,
) -> Result<FpVar<F>, SynthesisError> {
    let span = span!(Level::TRACE, "canonicalize");
    let _enter = span.enter();

    let max_bits = max_bits.unwrap_or(element.modulus_bits);
    let effective = effective_limbs(max_bits, element.bits_per_limb);
    if effective > element.limbs.len() {
        return Err(SynthesisError::Unsatisfiable);
    }

    for limb in &element.limbs[effective..] {
        limb.enforce_equal(&FpVar::zero())?;
    }

    let shift = F::from(2u64).pow([element.bits_per_limb as u64]);
    let composed = element.limbs[..effective]
        .iter()
        .rev()
        .fold(FpVar::zero(), |acc, limb| acc * shift + limb);

    let bound = if element.modulus_bits > SAFE_SCALAR_BITS {
        max_bits.min(SAFE_SCALAR_BITS)
    } else {
        max_bits
    };
    if bound < effective * element.bits_per_limb {
        debug!(bound = bound, "range checking composed scalar");
        enforce_bit_length(&composed, bound)?;
    }

    Ok(composed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::{print_unsatisfied_constraints, run_profile_constraints};
    use ark_bn254::{Fq, Fr};
    use ark_ff::UniformRand;
    use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};
    use header_crypto::{limbs::to_limbs, PrimeFieldLimbs};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    type Bn254Limbs = PrimeFieldLimbs<Fq>;
    type Bls12_377Limbs = PrimeFieldLimbs<ark_bls12_377::Fq>;

    #[tracing::instrument(target = "r1cs")]
    fn canonicalize_limbs<P: EmulatedParams>(
        limbs: &[u64],
        max_bits: Option<usize>,
    ) -> (ConstraintSystemRef<Fr>, Fr) {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let element = EmulatedVar::new_witness::<P>(cs.clone(), || Ok(limbs.to_vec())).unwrap();
        let composed = canonicalize(&element, max_bits).unwrap();
        let value = composed.value().unwrap();
        (cs, value)
    }

    #[test]
    fn recomposes_native_scalars() {
        run_profile_constraints(|| {
            let rng = &mut XorShiftRng::seed_from_u64(0);
            let value = Fr::rand(rng);
            let (cs, composed) =
                canonicalize_limbs::<PrimeFieldLimbs<Fr>>(&to_limbs(&value), None);
            print_unsatisfied_constraints(cs.clone());
            assert!(cs.is_satisfied().unwrap());
            assert_eq!(composed, value);
        });
    }

    #[test]
    fn byte_width_takes_the_low_limb() {
        run_profile_constraints(|| {
            let (cs, composed) = canonicalize_limbs::<Bn254Limbs>(&[0xab, 0, 0, 0], Some(8));
            print_unsatisfied_constraints(cs.clone());
            assert!(cs.is_satisfied().unwrap());
            assert_eq!(composed, Fr::from(0xabu64));
        });
    }

    #[test]
    fn nonzero_high_limb_is_unsatisfiable() {
        run_profile_constraints(|| {
            let (cs, _) = canonicalize_limbs::<Bn254Limbs>(&[0xab, 1, 0, 0], Some(8));
            assert!(!cs.is_satisfied().unwrap());
        });
    }

    #[test]
    fn byte_width_bounds_the_low_limb() {
        run_profile_constraints(|| {
            let (cs, _) = canonicalize_limbs::<Bn254Limbs>(&[256, 0, 0, 0], Some(8));
            assert!(!cs.is_satisfied().unwrap());

            let (cs, composed) = canonicalize_limbs::<Bn254Limbs>(&[255, 0, 0, 0], Some(8));
            assert!(cs.is_satisfied().unwrap());
            assert_eq!(composed, Fr::from(255u64));
        });
    }

    #[test]
    fn wide_moduli_are_range_checked() {
        run_profile_constraints(|| {
            let (cs, composed) =
                canonicalize_limbs::<Bls12_377Limbs>(&[7, 0, 0, 0, 0, 0], None);
            print_unsatisfied_constraints(cs.clone());
            assert!(cs.is_satisfied().unwrap());
            assert_eq!(composed, Fr::from(7u64));
        });
    }

    #[test]
    fn wrong_limb_count_is_rejected() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let result = EmulatedVar::new_witness::<Bn254Limbs>(cs, || Ok(vec![1, 2, 3]));
        assert!(result.is_err());
    }

    #[test]
    fn bit_length() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let x = FpVar::new_witness(cs.clone(), || Ok(Fr::from(255u64))).unwrap();
        enforce_bit_length(&x, 8).unwrap();
        assert!(cs.is_satisfied().unwrap());

        let cs = ConstraintSystem::<Fr>::new_ref();
        let x = FpVar::new_witness(cs.clone(), || Ok(Fr::from(256u64))).unwrap();
        enforce_bit_length(&x, 8).unwrap();
        assert!(!cs.is_satisfied().unwrap());

        assert!(enforce_bit_length(&FpVar::constant(Fr::from(256u64)), 8).is_err());
    }

    #[test]
    fn decomposes_little_endian() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let x = FpVar::new_witness(cs.clone(), || Ok(Fr::from(0b1011u64))).unwrap();
        let bits = le_bits(&x, 6).unwrap();
        assert_eq!(
            bits.value().unwrap(),
            vec![true, true, false, true, false, false]
        );
        assert!(cs.is_satisfied().unwrap());

        let constant = le_bits(&FpVar::constant(Fr::from(6u64)), 4).unwrap();
        assert!(constant.iter().all(|b| b.is_constant()));
        assert_eq!(constant.value().unwrap(), vec![false, true, true, false]);
    }
}
