//! Field elements that are foreign to a circuit's native field are carried as little-endian
//! vectors of fixed-width limbs. A limb is always smaller than `2^BITS_PER_LIMB`.
use crate::FingerprintError;
use ark_ff::{BigInteger, PrimeField};
use std::{fmt::Debug, marker::PhantomData};

/// Describes how the elements of an emulated field are split into limbs
pub trait EmulatedParams: 'static + Clone + Debug + Send + Sync {
    /// Width of each limb in bits
    const BITS_PER_LIMB: usize;

    /// Number of limbs of an element
    fn num_limbs() -> usize;

    /// Bit size of the emulated modulus
    fn modulus_bits() -> usize;
}

/// 64-bit limbs over the canonical representation of a prime field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimeFieldLimbs<T>(PhantomData<T>);

impl<T: PrimeField> EmulatedParams for PrimeFieldLimbs<T> {
    const BITS_PER_LIMB: usize = 64;

    fn num_limbs() -> usize {
        (Self::modulus_bits() + Self::BITS_PER_LIMB - 1) / Self::BITS_PER_LIMB
    }

    fn modulus_bits() -> usize {
        T::MODULUS_BIT_SIZE as usize
    }
}

/// Splits `value` into the 64-bit limbs of its canonical integer, least significant first
pub fn to_limbs<T: PrimeField>(value: &T) -> Vec<u64> {
    let limbs = value.into_bigint();
    limbs
        .as_ref()
        .iter()
        .take(PrimeFieldLimbs::<T>::num_limbs())
        .copied()
        .collect()
}

/// Number of limbs needed to hold `max_bits` bits
pub fn effective_limbs(max_bits: usize, bits_per_limb: usize) -> usize {
    (max_bits + bits_per_limb - 1) / bits_per_limb
}

/// Recomposes limbs into a native scalar with Horner's rule, most significant limb first.
/// The result is reduced modulo the native field.
pub fn compose<F: PrimeField>(limbs: &[u64], bits_per_limb: usize) -> F {
    let shift = F::from(2u64).pow([bits_per_limb as u64]);
    limbs
        .iter()
        .rev()
        .fold(F::zero(), |acc, limb| acc * shift + F::from(*limb))
}

/// Converts a native scalar into the limbs of the emulated field `T`, failing when the
/// scalar does not fit `T`'s modulus
pub fn native_to_limbs<F: PrimeField, T: PrimeField>(value: &F) -> Result<Vec<u64>, FingerprintError> {
    let bigint = value.into_bigint();
    if bigint.num_bits() > T::MODULUS_BIT_SIZE {
        return Err(FingerprintError::UnsupportedEncoding(
            "scalar is wider than the emulated modulus",
        ));
    }
    let emulated = T::from_bigint(T::BigInt::from_bits_le(&bigint.to_bits_le()))
        .ok_or(FingerprintError::UnsupportedEncoding(
            "scalar does not fit the emulated field",
        ))?;
    Ok(to_limbs(&emulated))
}

/// Checks that a limb vector has the limb count of `P`
pub fn check_limb_count<P: EmulatedParams>(limbs: &[u64]) -> Result<(), FingerprintError> {
    if limbs.len() != P::num_limbs() {
        return Err(FingerprintError::LimbCount {
            expected: P::num_limbs(),
            got: limbs.len(),
        });
    }
    Ok(())
}

/// True when every limb past the effective width of `max_bits` is zero
pub fn fits_bits(limbs: &[u64], bits_per_limb: usize, max_bits: usize) -> bool {
    let effective = effective_limbs(max_bits, bits_per_limb);
    limbs.iter().skip(effective).all(|limb| *limb == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::{Fq, Fr};
    use ark_ff::{One, UniformRand, Zero};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn bn254_uses_four_limbs() {
        assert_eq!(PrimeFieldLimbs::<Fr>::num_limbs(), 4);
        assert_eq!(PrimeFieldLimbs::<Fq>::num_limbs(), 4);
        assert_eq!(PrimeFieldLimbs::<Fq>::modulus_bits(), 254);
    }

    #[test]
    fn bls12_377_base_field_uses_six_limbs() {
        assert_eq!(PrimeFieldLimbs::<ark_bls12_377::Fq>::num_limbs(), 6);
        assert_eq!(PrimeFieldLimbs::<ark_bls12_377::Fq>::modulus_bits(), 377);
    }

    #[test]
    fn compose_inverts_split() {
        let rng = &mut XorShiftRng::seed_from_u64(0);
        for _ in 0..20 {
            let value = Fr::rand(rng);
            let limbs = to_limbs(&value);
            assert_eq!(limbs.len(), 4);
            assert_eq!(compose::<Fr>(&limbs, 64), value);
        }
    }

    #[test]
    fn compose_small_values() {
        assert_eq!(compose::<Fr>(&[0, 0, 0, 0], 64), Fr::zero());
        assert_eq!(compose::<Fr>(&[1, 0, 0, 0], 64), Fr::one());
        assert_eq!(compose::<Fr>(&[0, 1], 64), Fr::from(u64::MAX) + Fr::one());
    }

    #[test]
    fn native_scalars_move_into_wider_fields() {
        let rng = &mut XorShiftRng::seed_from_u64(1);
        let value = Fr::rand(rng);
        let limbs = native_to_limbs::<Fr, ark_bls12_377::Fq>(&value).unwrap();
        assert_eq!(limbs.len(), 6);
        assert_eq!(&limbs[..4], &to_limbs(&value)[..]);
        assert!(limbs[4..].iter().all(|l| *l == 0));
    }

    #[test]
    fn limb_count_is_checked() {
        assert!(check_limb_count::<PrimeFieldLimbs<Fq>>(&[0; 4]).is_ok());
        assert!(matches!(
            check_limb_count::<PrimeFieldLimbs<Fq>>(&[0; 3]),
            Err(FingerprintError::LimbCount { expected: 4, got: 3 })
        ));
    }

    #[test]
    fn high_limbs_bound_the_width() {
        assert!(fits_bits(&[255, 0, 0, 0], 64, 8));
        assert!(!fits_bits(&[255, 1, 0, 0], 64, 8));
        assert!(fits_bits(&[u64::MAX, 7, 0, 0], 64, 128));
    }
}
