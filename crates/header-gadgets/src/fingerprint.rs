use ark_crypto_primitives::sponge::{
    constraints::CryptographicSpongeVar,
    poseidon::{constraints::PoseidonSpongeVar, PoseidonConfig},
};
use ark_ff::PrimeField;
use ark_r1cs_std::{
    alloc::{AllocVar, AllocationMode},
    boolean::Boolean,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
    R1CSVar, ToBitsGadget, ToConstraintFieldGadget,
};
use ark_relations::r1cs::{ConstraintSystemRef, Namespace, SynthesisError};
use header_crypto::{GroupElement, VerifyingKeyRecord, SAFE_SCALAR_BITS};
use std::borrow::Borrow;
use tracing::{debug, span, Level};

/// The coordinates of a commitment group element in the circuit
#[derive(Clone, Debug)]
pub enum GroupElementVar<F: PrimeField> {
    Native { x: Vec<FpVar<F>>, y: Vec<FpVar<F>> },
    Emulated { x: Vec<FpVar<F>>, y: Vec<FpVar<F>> },
}

impl<F: PrimeField> GroupElementVar<F> {
    /// The native coordinates of an allocated curve point. The point must not be the identity.
    pub fn from_point<C: ToConstraintFieldGadget<F>>(point: &C) -> Result<Self, SynthesisError> {
        let mut elements = point.to_constraint_field()?;
        let infinity = elements.pop().ok_or(SynthesisError::Unsatisfiable)?;
        infinity.enforce_equal(&FpVar::zero())?;
        if elements.len() % 2 != 0 {
            return Err(SynthesisError::Unsatisfiable);
        }
        let y = elements.split_off(elements.len() / 2);
        Ok(GroupElementVar::Native { x: elements, y })
    }

    fn extend_elements(&self, out: &mut Vec<FpVar<F>>) {
        match self {
            GroupElementVar::Native { x, y } | GroupElementVar::Emulated { x, y } => {
                out.extend(x.iter().cloned());
                out.extend(y.iter().cloned());
            }
        }
    }
}

impl<F: PrimeField> AllocVar<GroupElement<F>, F> for GroupElementVar<F> {
    fn new_variable<T: Borrow<GroupElement<F>>>(
        cs: impl Into<Namespace<F>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        f().and_then(|element| match element.borrow() {
            GroupElement::Native { x, y } => Ok(GroupElementVar::Native {
                x: Vec::new_variable(cs.clone(), || Ok(x.clone()), mode)?,
                y: Vec::new_variable(cs.clone(), || Ok(y.clone()), mode)?,
            }),
            GroupElement::Emulated { x, y } => Ok(GroupElementVar::Emulated {
                x: alloc_limbs(cs.clone(), x, mode)?,
                y: alloc_limbs(cs.clone(), y, mode)?,
            }),
        })
    }
}

// The fingerprint binds limbs as given, so they are not range checked here
fn alloc_limbs<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    limbs: &[u64],
    mode: AllocationMode,
) -> Result<Vec<FpVar<F>>, SynthesisError> {
    limbs
        .iter()
        .map(|limb| FpVar::new_variable(cs.clone(), || Ok(F::from(*limb)), mode))
        .collect()
}

/// The structural fields of a verifying key, allocated in the circuit
#[derive(Clone, Debug)]
pub struct VerifyingKeyRecordVar<F: PrimeField> {
    pub num_public: FpVar<F>,
    pub domain_size: FpVar<F>,
    pub generator: Vec<FpVar<F>>,
    pub commitments: Vec<GroupElementVar<F>>,
    pub commitment_indexes: Vec<FpVar<F>>,
}

impl<F: PrimeField> VerifyingKeyRecordVar<F> {
    /// The absorbed elements, in the same order as the native record
    pub fn elements(&self) -> Vec<FpVar<F>> {
        let mut out = vec![self.num_public.clone(), self.domain_size.clone()];
        out.extend(self.generator.iter().cloned());
        for commitment in &self.commitments {
            commitment.extend_elements(&mut out);
        }
        out.extend(self.commitment_indexes.iter().cloned());
        out
    }

    /// Computes the fingerprint of the key in the circuit, reduced to `SAFE_SCALAR_BITS` bits
    /// like the native one
    pub fn fingerprint(&self, config: &PoseidonConfig<F>) -> Result<FpVar<F>, SynthesisError> {
        let span = span!(Level::TRACE, "fingerprint");
        let _enter = span.enter();

        let elements = self.elements();
        debug!("absorbing {} verifying key elements", elements.len());
        let mut sponge = PoseidonSpongeVar::new(elements.cs(), config);
        sponge.absorb(&elements)?;
        let digest = sponge
            .squeeze_field_elements(1)?
            .pop()
            .ok_or(SynthesisError::Unsatisfiable)?;
        if F::MODULUS_BIT_SIZE as usize <= SAFE_SCALAR_BITS {
            return Ok(digest);
        }
        let bits = digest.to_bits_le()?;
        Boolean::le_bits_to_fp_var(&bits[..SAFE_SCALAR_BITS])
    }
}

impl<F: PrimeField> AllocVar<VerifyingKeyRecord<F>, F> for VerifyingKeyRecordVar<F> {
    fn new_variable<T: Borrow<VerifyingKeyRecord<F>>>(
        cs: impl Into<Namespace<F>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        f().and_then(|record| {
            let record = record.borrow();
            Ok(Self {
                num_public: FpVar::new_variable(
                    cs.clone(),
                    || Ok(F::from(record.num_public)),
                    mode,
                )?,
                domain_size: FpVar::new_variable(
                    cs.clone(),
                    || Ok(F::from(record.domain_size)),
                    mode,
                )?,
                generator: alloc_limbs(cs.clone(), &record.generator, mode)?,
                commitments: Vec::new_variable(cs.clone(), || Ok(&record.commitments[..]), mode)?,
                commitment_indexes: alloc_limbs(cs.clone(), &record.commitment_indexes, mode)?,
            })
        })
    }
}
