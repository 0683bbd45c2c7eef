mod prover;
pub use prover::{prove_chain, prove_fold, prove_leaf, ChainProof, ProofKind, ProverError};

mod setup;
pub use setup::{
    setup, setup_aggregator, setup_leaf, trusted_setup, AggregatorParameters, FoldParameters,
    LeafParameters, Parameters,
};

mod verifier;
pub use verifier::{verify, verify_final, VerificationError};
