use crate::{
    api::{Parameters, VerificationError},
    backend::{Backend, RecursiveBackend},
    gadgets::{Aggregator, ChildProof, LeafTransition, Wrapper},
    PublicWitness,
};
use ark_relations::r1cs::SynthesisError;
use header_crypto::{FingerprintError, Hash, RawHeader};
use rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, span, Level};

#[derive(Debug, Error)]
/// Errors raised while setting up or proving
pub enum ProverError {
    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("{circuit} assignment is unsatisfied at {constraint}")]
    Unsatisfied {
        circuit: &'static str,
        constraint: String,
    },
    #[error("fingerprint error: {0}")]
    Fingerprint(#[from] FingerprintError),
    #[error("produced proof does not verify: {0}")]
    Verification(#[from] VerificationError),
    #[error("cannot prove an empty chain of headers")]
    EmptyChain,
    #[error("header {index}: {source}")]
    Step {
        index: usize,
        #[source]
        source: Box<ProverError>,
    },
}

impl ProverError {
    fn at(index: usize) -> impl FnOnce(ProverError) -> ProverError {
        move |source| ProverError::Step {
            index,
            source: Box::new(source),
        }
    }
}

/// Whether a proof was produced by the leaf or the aggregator circuit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofKind {
    Leaf,
    Aggregator,
}

/// A proof of the transition `begin -> end` over a run of consecutive headers
pub struct ChainProof<B: RecursiveBackend> {
    pub kind: ProofKind,
    pub proof: B::Proof,
    pub witness: PublicWitness<B::Field>,
    pub begin: Hash,
    pub end: Hash,
}

impl<B: RecursiveBackend> ChainProof<B> {
    /// The verifying key the proof must be checked against
    pub fn vk<'a>(&self, params: &'a Parameters<B>) -> &'a B::VerifyingKey {
        match self.kind {
            ProofKind::Leaf => &params.leaf.vk,
            ProofKind::Aggregator => &params.aggregator.vk,
        }
    }
}

/// Proves the transition from a header's parent hash to its own hash. The fingerprint slot of
/// the public witness is set to the leaf fingerprint.
pub fn prove_leaf<B: RecursiveBackend, R: RngCore + CryptoRng>(
    params: &Parameters<B>,
    header: &RawHeader,
    rng: &mut R,
) -> Result<(B::Proof, PublicWitness<B::Field>), ProverError> {
    let leaf = &params.leaf;
    let span = span!(Level::TRACE, "prove_leaf");
    let _enter = span.enter();
    info!("proving {} -> {}", header.parent_hash(), header.hash());

    let circuit = LeafTransition::new(header, leaf.fingerprint.scalar());
    let (proof, witness) = B::prove(&leaf.compiled, &leaf.pk, circuit, rng)?;
    B::verify(&leaf.vk, &proof, &witness)?;
    Ok((proof, witness))
}

/// Folds `left` over `begin -> relay` and `right` over `relay -> end` into one proof of
/// `begin -> end`. `right` must be a leaf proof; `left` may be a leaf or an aggregator proof.
/// The fold is proven over the partner backend, then wrapped back into a proof under the
/// aggregator key.
pub fn prove_fold<B: RecursiveBackend, R: RngCore + CryptoRng>(
    params: &Parameters<B>,
    left: &ChildProof<B>,
    right: &ChildProof<B>,
    begin: &Hash,
    relay: &Hash,
    end: &Hash,
    rng: &mut R,
) -> Result<(B::Proof, PublicWitness<B::Field>), ProverError> {
    let aggregator = &params.aggregator;
    let span = span!(Level::TRACE, "prove_fold");
    let _enter = span.enter();
    info!("folding {} -> {} -> {}", begin, relay, end);

    let circuit = Aggregator {
        leaf_fingerprint: aggregator.leaf_fingerprint,
        self_fingerprint: Some(aggregator.fingerprint),
        begin: Some(*begin),
        relay: Some(*relay),
        end: Some(*end),
        first: left.clone(),
        second: right.clone(),
    };
    let fold = &aggregator.fold;
    let (proof, witness) = B::Verifier::prove(&fold.compiled, &fold.pk, circuit, rng)?;
    B::Verifier::verify(&fold.vk, &proof, &witness)?;

    debug!("wrapping the fold");
    let circuit = Wrapper::<B> {
        vk: fold.vk.clone(),
        proof,
        begin: Some(*begin),
        end: Some(*end),
        fingerprint: Some(aggregator.fingerprint),
    };
    let (proof, witness) = B::prove(&aggregator.compiled, &aggregator.pk, circuit, rng)?;
    B::verify(&aggregator.vk, &proof, &witness)?;
    Ok((proof, witness))
}

/// Proves a run of consecutive headers. Leaves are proven in parallel, each with its own RNG
/// seeded from `rng`, then folded left to right.
pub fn prove_chain<B: RecursiveBackend, R: RngCore + CryptoRng>(
    params: &Parameters<B>,
    headers: &[RawHeader],
    rng: &mut R,
) -> Result<ChainProof<B>, ProverError> {
    let first = headers.first().ok_or(ProverError::EmptyChain)?;
    let begin = first.parent_hash();
    info!("proving a chain of {} headers from {}", headers.len(), begin);

    let seeds = headers
        .iter()
        .map(|_| {
            let mut seed = [0u8; 32];
            rng.fill_bytes(&mut seed);
            seed
        })
        .collect::<Vec<_>>();
    let leaves = headers
        .par_iter()
        .zip(seeds.par_iter())
        .enumerate()
        .map(|(index, (header, seed))| {
            let rng = &mut StdRng::from_seed(*seed);
            prove_leaf(params, header, rng)
                .map(|(proof, witness)| ChildProof {
                    vk: params.leaf.vk.clone(),
                    proof,
                    witness,
                })
                .map_err(ProverError::at(index))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut leaves = leaves.into_iter();
    let mut acc = leaves.next().ok_or(ProverError::EmptyChain)?;
    let mut kind = ProofKind::Leaf;
    let mut relay = first.hash();
    for (offset, (right, header)) in leaves.zip(&headers[1..]).enumerate() {
        let index = offset + 1;
        let end = header.hash();
        debug!("folding header {} into the accumulator", index);
        let (proof, witness) = prove_fold(params, &acc, &right, &begin, &relay, &end, rng)
            .map_err(ProverError::at(index))?;
        acc = ChildProof {
            vk: params.aggregator.vk.clone(),
            proof,
            witness,
        };
        kind = ProofKind::Aggregator;
        relay = end;
    }

    Ok(ChainProof {
        kind,
        proof: acc.proof,
        witness: acc.witness,
        begin,
        end: relay,
    })
}
