use ark_crypto_primitives::crh::sha256::constraints::Sha256Gadget;
use ark_ff::PrimeField;
use ark_r1cs_std::{
    alloc::{AllocVar, AllocationMode},
    boolean::Boolean,
    eq::EqGadget,
    fields::fp::FpVar,
    uint8::UInt8,
    ToBitsGadget,
};
use ark_relations::r1cs::{Namespace, SynthesisError};
use header_crypto::{Hash, HASH_LEN};
use std::borrow::Borrow;
use tracing::{span, Level};

/// Enforces `SHA256(SHA256(message))` and returns the 32 digest bytes
pub fn double_sha256<F: PrimeField>(message: &[UInt8<F>]) -> Result<Vec<UInt8<F>>, SynthesisError> {
    let span = span!(Level::TRACE, "double_sha256");
    let _enter = span.enter();

    let first = Sha256Gadget::digest(message)?;
    let second = Sha256Gadget::digest(&first.0)?;
    Ok(second.0)
}

/// Packs each byte into one field element
pub fn bytes_to_fp<F: PrimeField>(bytes: &[UInt8<F>]) -> Result<Vec<FpVar<F>>, SynthesisError> {
    bytes
        .iter()
        .map(|byte| Boolean::le_bits_to_fp_var(&ToBitsGadget::to_bits_le(byte)?))
        .collect()
}

/// A block hash in the circuit, one field element per byte
#[derive(Clone, Debug)]
pub struct HashVar<F: PrimeField>(pub Vec<FpVar<F>>);

impl<F: PrimeField> HashVar<F> {
    /// Wraps 32 byte-valued field elements
    pub fn from_elements(elements: Vec<FpVar<F>>) -> Result<Self, SynthesisError> {
        if elements.len() != HASH_LEN {
            return Err(SynthesisError::Unsatisfiable);
        }
        Ok(Self(elements))
    }

    /// Converts 32 bytes into a hash
    pub fn from_bytes(bytes: &[UInt8<F>]) -> Result<Self, SynthesisError> {
        Self::from_elements(bytes_to_fp(bytes)?)
    }

    /// Allocates a hash whose elements are constrained to be bytes
    pub fn new_bytes_witness(
        cs: impl Into<Namespace<F>>,
        hash: Option<Hash>,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let values = match hash {
            Some(hash) => hash.0.iter().map(|b| Some(*b)).collect::<Vec<_>>(),
            None => vec![None; HASH_LEN],
        };
        let bytes = UInt8::new_witness_vec(cs, &values)?;
        Self::from_bytes(&bytes)
    }

    /// Enforces byte-wise equality
    pub fn enforce_equal(&self, other: &Self) -> Result<(), SynthesisError> {
        for (a, b) in self.0.iter().zip(&other.0) {
            a.enforce_equal(b)?;
        }
        Ok(())
    }
}

impl<F: PrimeField> AllocVar<Hash, F> for HashVar<F> {
    fn new_variable<T: Borrow<Hash>>(
        cs: impl Into<Namespace<F>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let hash = f().map(|h| *h.borrow()).ok();
        let elements = (0..HASH_LEN)
            .map(|i| {
                FpVar::new_variable(
                    cs.clone(),
                    || {
                        hash.map(|h| F::from(h.0[i]))
                            .ok_or(SynthesisError::AssignmentMissing)
                    },
                    mode,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(elements))
    }
}
