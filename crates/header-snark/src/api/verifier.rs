use crate::{backend::RecursiveBackend, PublicWitness};
use ark_relations::r1cs::SynthesisError;
use header_crypto::{FingerprintError, Hash};
use thiserror::Error;
use tracing::{info, span, warn, Level};

#[derive(Debug, Error)]
/// Errors raised while verifying a proof
pub enum VerificationError {
    #[error("proof verification failed")]
    VerificationFailed,
    #[error("public witness fingerprint does not match the verifying key")]
    FingerprintMismatch,
    #[error("public witness is malformed")]
    MalformedWitness,
    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("fingerprint error: {0}")]
    Fingerprint(#[from] FingerprintError),
}

/// Verifies the final proof of a chain. The fingerprint slot of the witness must hold the
/// fingerprint of `vk`, which rules out leaf proofs presented under the aggregator key and
/// aggregator proofs claiming a foreign key.
pub fn verify_final<B: RecursiveBackend>(
    vk: &B::VerifyingKey,
    proof: &B::Proof,
    witness: &PublicWitness<B::Field>,
) -> Result<(), VerificationError> {
    let span = span!(Level::TRACE, "verify_final");
    let _enter = span.enter();

    let fingerprint = B::fingerprint(vk)?;
    if witness.fingerprint()? != fingerprint {
        warn!("witness claims fingerprint {}, key has {}", witness.fingerprint()?, fingerprint);
        return Err(VerificationError::FingerprintMismatch);
    }
    B::verify(vk, proof, witness)?;
    info!(
        "verified {} -> {}",
        witness.begin_hash()?,
        witness.end_hash()?
    );
    Ok(())
}

/// Verifies that `proof` attests to the transition `begin -> end` under `vk`
pub fn verify<B: RecursiveBackend>(
    vk: &B::VerifyingKey,
    begin: &Hash,
    end: &Hash,
    proof: &B::Proof,
) -> Result<(), VerificationError> {
    let fingerprint = B::fingerprint(vk)?;
    let witness = PublicWitness::new(begin, end, &fingerprint);
    verify_final::<B>(vk, proof, &witness)
}
