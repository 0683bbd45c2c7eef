//! Setup: one set of keys for the leaf transition circuit, then one for the aggregator, which
//! embeds the leaf fingerprint and receives its own as a public input. The aggregator is keyed
//! in two steps: the folding circuit over the partner backend, then the wrapper that brings its
//! proofs back to the leaf curve and whose key stands for the aggregator.
use crate::{
    api::ProverError,
    backend::{Backend, Mnt4Backend, RecursiveBackend},
    gadgets::{Aggregator, LeafTransition, Wrapper},
};
use header_crypto::Fingerprint;
use rand::{CryptoRng, RngCore};
use tracing::{info, span, Level};

type Result<T> = std::result::Result<T, ProverError>;

/// Keys of the leaf transition circuit
pub struct LeafParameters<B: Backend> {
    pub compiled: B::CompiledCircuit,
    pub pk: B::ProvingKey,
    pub vk: B::VerifyingKey,
    pub fingerprint: Fingerprint<B::Field>,
    /// Canonical byte form of the fingerprint, as embedded in the aggregator
    pub fingerprint_bytes: Vec<u8>,
}

/// Keys of the folding circuit, over the partner backend
pub struct FoldParameters<B: Backend> {
    pub compiled: B::CompiledCircuit,
    pub pk: B::ProvingKey,
    pub vk: B::VerifyingKey,
}

/// Keys of the aggregator. `vk` is the wrapper's key, under which every aggregate proof is
/// verified.
pub struct AggregatorParameters<B: RecursiveBackend> {
    pub fold: FoldParameters<B::Verifier>,
    pub compiled: B::CompiledCircuit,
    pub pk: B::ProvingKey,
    pub vk: B::VerifyingKey,
    /// The aggregator's own fingerprint, assigned on every fold
    pub fingerprint: Fingerprint<B::Field>,
    /// The leaf fingerprint the circuit was built with
    pub leaf_fingerprint: Fingerprint<B::Field>,
}

/// Public parameters for both circuits
pub struct Parameters<B: RecursiveBackend> {
    pub leaf: LeafParameters<B>,
    pub aggregator: AggregatorParameters<B>,
}

/// Initializes the leaf and aggregator circuits over Groth16 on the MNT4-298 / MNT6-298 cycle
/// with random parameters seeded by the provided RNG. A seeded RNG yields the same keys, and
/// the same fingerprints, every run.
pub fn trusted_setup<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Parameters<Mnt4Backend>> {
    setup::<Mnt4Backend, R>(rng)
}

/// Runs both setups in order over the backend `B`
pub fn setup<B: RecursiveBackend, R: RngCore + CryptoRng>(rng: &mut R) -> Result<Parameters<B>> {
    let leaf = setup_leaf::<B, R>(rng)?;
    let aggregator = setup_aggregator(&leaf, rng)?;
    Ok(Parameters { leaf, aggregator })
}

/// Compiles and keys the leaf transition circuit and derives its fingerprint
pub fn setup_leaf<B: RecursiveBackend, R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<LeafParameters<B>> {
    info!("Generating parameters for the leaf transition circuit");
    let span = span!(Level::TRACE, "setup_leaf");
    let _enter = span.enter();

    let compiled = B::compile("leaf", LeafTransition::<B::Field>::empty())?;
    let (pk, vk) = B::setup(&compiled, LeafTransition::<B::Field>::empty(), rng)?;
    let fingerprint = B::fingerprint(&vk)?;
    let fingerprint_bytes = fingerprint.to_bytes()?;

    Ok(LeafParameters {
        compiled,
        pk,
        vk,
        fingerprint,
        fingerprint_bytes,
    })
}

/// Compiles and keys the aggregator. The folding circuit is shaped with placeholder children
/// under the leaf key and keyed first, since the wrapper embeds its verifying key. The
/// aggregator's fingerprint is only known once the wrapper is keyed, and is then assigned as a
/// public input on every fold.
pub fn setup_aggregator<B: RecursiveBackend, R: RngCore + CryptoRng>(
    leaf: &LeafParameters<B>,
    rng: &mut R,
) -> Result<AggregatorParameters<B>> {
    info!("Generating parameters for the aggregator circuit");
    let span = span!(Level::TRACE, "setup_aggregator");
    let _enter = span.enter();

    let leaf_fingerprint = Fingerprint::from_bytes(&leaf.fingerprint_bytes)?;
    let compiled = B::Verifier::compile(
        "aggregator",
        Aggregator::<B>::empty(leaf_fingerprint, &leaf.vk),
    )?;
    let (pk, vk) = B::Verifier::setup(
        &compiled,
        Aggregator::<B>::empty(leaf_fingerprint, &leaf.vk),
        rng,
    )?;
    let fold: FoldParameters<B::Verifier> = FoldParameters { compiled, pk, vk };

    info!("Generating parameters for the aggregator wrapper");
    let compiled = B::compile("wrapper", Wrapper::<B>::empty(fold.vk.clone()))?;
    let (pk, vk) = B::setup(&compiled, Wrapper::<B>::empty(fold.vk.clone()), rng)?;
    let fingerprint = B::fingerprint(&vk)?;

    Ok(AggregatorParameters {
        fold,
        compiled,
        pk,
        vk,
        fingerprint,
        leaf_fingerprint,
    })
}
