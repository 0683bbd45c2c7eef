//! A fingerprint is a single native scalar which identifies a verifying key by its structure.
//! It is computed by absorbing, in order, the public input count, the domain size, the limbs
//! of the domain generator, the coordinates of every commitment group element and the
//! commitment constraint indexes into a Poseidon sponge, and squeezing one element. The
//! squeezed element is reduced to its low `SAFE_SCALAR_BITS` bits, so a fingerprint computed
//! over one field of a curve cycle is also a scalar of the other.
//!
//! The same absorption order is reproduced in-circuit, so both routines must agree exactly.
use crate::{
    limbs::{to_limbs, EmulatedParams, PrimeFieldLimbs},
    FingerprintError, SAFE_SCALAR_BITS,
};
use ark_crypto_primitives::sponge::{
    poseidon::{PoseidonConfig, PoseidonSponge},
    Absorb, CryptographicSponge, FieldBasedCryptographicSponge,
};
use ark_ff::{BigInteger, PrimeField, ToConstraintField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use log::debug;
use std::fmt;

/// Curve families whose group elements may appear in a verifying key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupFamily {
    Bn254,
    Bls12_381,
    Bls12_377,
    Bls24_315,
    Bw6_761,
    Mnt4_298,
    Mnt6_298,
}

/// How the coordinates of a group element are represented in the circuit field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitmentEncoding {
    /// Coordinates are elements of the circuit field
    Native,
    /// Coordinates are split into limbs of `bits_per_limb` bits
    Emulated { bits_per_limb: usize },
}

impl CommitmentEncoding {
    /// Resolves the encoding of a group whose coordinates live in `Q`, for a circuit over `F`.
    ///
    /// BLS12-377 and BLS24-315 are the inner curves of 2-chains and MNT4-298 and MNT6-298
    /// form a cycle, so their coordinates are native to the outer circuit. Every other family
    /// is emulated.
    pub fn resolve<Q: PrimeField, F: PrimeField>(
        family: GroupFamily,
    ) -> Result<Self, FingerprintError> {
        match family {
            GroupFamily::Bls12_377
            | GroupFamily::Bls24_315
            | GroupFamily::Mnt4_298
            | GroupFamily::Mnt6_298 => {
                if Q::MODULUS.as_ref() != F::MODULUS.as_ref() {
                    return Err(FingerprintError::UnsupportedEncoding(
                        "native coordinates must live in the circuit field",
                    ));
                }
                Ok(CommitmentEncoding::Native)
            }
            GroupFamily::Bn254 | GroupFamily::Bls12_381 | GroupFamily::Bw6_761 => {
                Ok(CommitmentEncoding::Emulated {
                    bits_per_limb: PrimeFieldLimbs::<Q>::BITS_PER_LIMB,
                })
            }
        }
    }
}

/// The affine coordinates of a group element, as absorbed by the fingerprint. Coordinates
/// over an extension field are given by their base field components, lowest degree first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupElement<F> {
    Native { x: Vec<F>, y: Vec<F> },
    Emulated { x: Vec<u64>, y: Vec<u64> },
}

impl<F: PrimeField> GroupElement<F> {
    /// Encodes a point given the base field components of its coordinates
    pub fn encode<Q: PrimeField>(
        x: &[Q],
        y: &[Q],
        encoding: CommitmentEncoding,
    ) -> Result<Self, FingerprintError> {
        match encoding {
            CommitmentEncoding::Native => Ok(GroupElement::Native {
                x: x.iter().map(to_native).collect::<Result<_, _>>()?,
                y: y.iter().map(to_native).collect::<Result<_, _>>()?,
            }),
            CommitmentEncoding::Emulated { bits_per_limb } => {
                if bits_per_limb != PrimeFieldLimbs::<Q>::BITS_PER_LIMB {
                    return Err(FingerprintError::UnsupportedEncoding(
                        "limb width differs from the coordinate field",
                    ));
                }
                Ok(GroupElement::Emulated {
                    x: x.iter().flat_map(to_limbs).collect(),
                    y: y.iter().flat_map(to_limbs).collect(),
                })
            }
        }
    }

    /// Encodes an affine point whose coordinates are native to `F`, from its constraint field
    /// form: the components of `x`, those of `y`, then the infinity flag. The identity has no
    /// affine coordinates and is refused.
    pub fn from_point<P: ToConstraintField<F>>(point: &P) -> Result<Self, FingerprintError> {
        let mut elements = point
            .to_field_elements()
            .ok_or(FingerprintError::UnsupportedEncoding("point has no field encoding"))?;
        let infinity = elements
            .pop()
            .ok_or(FingerprintError::UnsupportedEncoding("point has no field encoding"))?;
        if !infinity.is_zero() || elements.len() % 2 != 0 {
            return Err(FingerprintError::UnsupportedEncoding(
                "identity has no affine coordinates",
            ));
        }
        let y = elements.split_off(elements.len() / 2);
        Ok(GroupElement::Native { x: elements, y })
    }

    /// Appends the absorbed elements of this point to `out`
    pub fn extend_elements(&self, out: &mut Vec<F>) {
        match self {
            GroupElement::Native { x, y } => {
                out.extend_from_slice(x);
                out.extend_from_slice(y);
            }
            GroupElement::Emulated { x, y } => {
                out.extend(x.iter().chain(y.iter()).map(|limb| F::from(*limb)));
            }
        }
    }
}

fn to_native<Q: PrimeField, F: PrimeField>(value: &Q) -> Result<F, FingerprintError> {
    let bits = value.into_bigint().to_bits_le();
    let width = (F::MODULUS_BIT_SIZE as usize).min(bits.len());
    if bits[width..].iter().any(|bit| *bit) {
        return Err(FingerprintError::UnsupportedEncoding(
            "value does not fit the target field",
        ));
    }
    F::from_bigint(F::BigInt::from_bits_le(&bits[..width])).ok_or(
        FingerprintError::UnsupportedEncoding("value does not fit the target field"),
    )
}

/// Keeps the low `SAFE_SCALAR_BITS` bits of `digest`
fn truncate<F: PrimeField>(digest: F) -> F {
    if F::MODULUS_BIT_SIZE as usize <= SAFE_SCALAR_BITS {
        return digest;
    }
    let mut bits = digest.into_bigint().to_bits_le();
    bits.truncate(SAFE_SCALAR_BITS);
    F::from_le_bytes_mod_order(&F::BigInt::from_bits_le(&bits).to_bytes_le())
}

/// The structural fields of a verifying key which make up its identity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKeyRecord<F> {
    /// Number of public inputs
    pub num_public: u64,
    /// Size of the evaluation domain
    pub domain_size: u64,
    /// Limbs of the domain generator
    pub generator: Vec<u64>,
    /// Commitment group elements, in key order
    pub commitments: Vec<GroupElement<F>>,
    /// Indexes of the constraints bound to commitments
    pub commitment_indexes: Vec<u64>,
}

impl<F: PrimeField + Absorb> VerifyingKeyRecord<F> {
    /// The field elements absorbed by the fingerprint, in order
    pub fn elements(&self) -> Vec<F> {
        let mut out = vec![F::from(self.num_public), F::from(self.domain_size)];
        out.extend(self.generator.iter().map(|limb| F::from(*limb)));
        for commitment in &self.commitments {
            commitment.extend_elements(&mut out);
        }
        out.extend(self.commitment_indexes.iter().map(|i| F::from(*i)));
        out
    }

    /// Computes the fingerprint of the key
    pub fn fingerprint(&self, config: &PoseidonConfig<F>) -> Fingerprint<F> {
        let elements = self.elements();
        debug!("fingerprinting {} verifying key elements", elements.len());
        let mut sponge = PoseidonSponge::new(config);
        sponge.absorb(&elements);
        Fingerprint(truncate(sponge.squeeze_native_field_elements(1)[0]))
    }
}

/// Identity of a verifying key
#[derive(Clone, Copy, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Fingerprint<F: PrimeField>(pub F);

impl<F: PrimeField> Fingerprint<F> {
    /// Width in bytes of one serialized field element
    pub fn byte_width() -> usize {
        F::zero().compressed_size()
    }

    pub fn scalar(&self) -> F {
        self.0
    }

    /// The same integer as a scalar of `G`. Fingerprints are at most `SAFE_SCALAR_BITS` wide,
    /// so this only fails for values which were not produced by the engine.
    pub fn cast<G: PrimeField>(&self) -> Result<Fingerprint<G>, FingerprintError> {
        Ok(Fingerprint(to_native(&self.0)?))
    }

    /// Canonical little-endian byte form
    pub fn to_bytes(&self) -> Result<Vec<u8>, FingerprintError> {
        let mut bytes = Vec::with_capacity(Self::byte_width());
        self.0.serialize_compressed(&mut bytes)?;
        Ok(bytes)
    }

    /// Parses the byte form of a fingerprint. The bytes must encode exactly one canonical
    /// field element.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FingerprintError> {
        let width = Self::byte_width();
        if bytes.len() != width {
            return Err(FingerprintError::InvalidWidth {
                expected: width,
                got: bytes.len(),
            });
        }
        Ok(Self(F::deserialize_compressed(bytes)?))
    }
}

impl<F: PrimeField> From<F> for Fingerprint<F> {
    fn from(scalar: F) -> Self {
        Self(scalar)
    }
}

impl<F: PrimeField> fmt::Display for Fingerprint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = Vec::new();
        self.0
            .serialize_compressed(&mut bytes)
            .map_err(|_| fmt::Error)?;
        write!(f, "{}", hex::encode(bytes))
    }
}

impl<F: PrimeField> fmt::Debug for Fingerprint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}
