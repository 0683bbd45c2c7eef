//! # Header Chain SNARK
//!
//! Proves that a run of consecutive block headers links a begin hash to an end hash.
//!
//! Every header is proven by the leaf transition circuit: the header embeds the begin hash as
//! its parent and its double SHA-256 is the end hash. Proofs are then folded pairwise by the
//! aggregator, which runs the Groth16 verifier on both children inside the circuit and checks
//! that the first child ends where the second begins. The result is a single constant-size
//! proof for the whole run.
//!
//! Recursion runs over the MNT4-298 / MNT6-298 cycle. Leaves are proven on MNT4-298. A fold is
//! proven on MNT6-298, whose scalar field is the base field of MNT4-298, and is then wrapped:
//! a second circuit on MNT4-298 verifies the fold and republishes its public inputs, so that
//! aggregates can be folded again like leaves.
//!
//! Leaf and aggregator proofs share one public witness layout:
//!
//! - `[0, 32)`: the bytes of the begin hash
//! - `[32, 64)`: the bytes of the end hash
//! - `64`: the fingerprint of the verifying key the proof claims
//!
//! The aggregator accepts a first child under either the leaf key or its own key, and a
//! second child under the leaf key only. Keys are identified by their fingerprint, a Poseidon
//! digest of their structure. The aggregator's own fingerprint cannot be known before its
//! keys exist, so it is a public input, which the final verifier checks against the key.

/// High level methods for generating parameters and producing and verifying proofs over a
/// chain of headers
mod api;
pub use api::*;

/// The argument system behind both circuits
pub mod backend;

mod gadgets;
pub use gadgets::{Aggregator, ChildProof, LeafTransition, Wrapper};

mod witness;
pub use witness::PublicWitness;

pub use header_crypto::{Fingerprint, FingerprintError, Hash, HeaderError, RawHeader};

/// Pairing engine of the default backend
pub type Curve = ark_mnt4_298::MNT4_298;
/// Scalar field of the leaf and wrapper circuits
pub type Field = ark_mnt4_298::Fr;
