//! # Header Cryptography
//!
//! Off-circuit primitives for proving that a range of block headers forms a hash-linked chain:
//! the header model and its double SHA-256, the limb representation used for field elements
//! which are foreign to a circuit, and the verifying-key fingerprint engine.

/// Block headers and their hashes
mod header;
pub use header::{double_sha256, Hash, RawHeader};

/// Limb decomposition of non-native field elements
pub mod limbs;
pub use limbs::{EmulatedParams, PrimeFieldLimbs};

/// Verifying key fingerprints
pub mod fingerprint;
pub use fingerprint::{
    CommitmentEncoding, Fingerprint, GroupElement, GroupFamily, VerifyingKeyRecord,
};

/// Sponge parameters of the fingerprint engine
pub mod poseidon;

use ark_serialize::SerializationError;
use thiserror::Error;

/// Length in bytes of a block hash
pub const HASH_LEN: usize = 32;

/// Length in bytes of a serialized block header
pub const HEADER_LEN: usize = 80;

/// Offset of the parent hash inside a serialized header
pub const PARENT_HASH_OFFSET: usize = 4;

/// Offset of the begin hash bytes in a public witness
pub const BEGIN_HASH_OFFSET: usize = 0;

/// Offset of the end hash bytes in a public witness
pub const END_HASH_OFFSET: usize = BEGIN_HASH_OFFSET + HASH_LEN;

/// Offset of the verifying key fingerprint in a public witness
pub const FINGERPRINT_OFFSET: usize = END_HASH_OFFSET + HASH_LEN;

/// Number of public inputs exposed by every circuit of the protocol
pub const NUM_PUBLIC_INPUTS: usize = FINGERPRINT_OFFSET + 1;

/// Widest scalar which is safe to recompose without a range check. Fingerprints are reduced
/// to this width so that they are valid scalars on both curves of a cycle.
pub const SAFE_SCALAR_BITS: usize = 254;

#[derive(Debug, Error)]
/// Errors raised while parsing headers and hashes
pub enum HeaderError {
    /// The input does not have the length of the object being parsed
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
    /// Invalid hex string
    #[error("{0}")]
    Hex(#[from] hex::FromHexError),
}

#[derive(Debug, Error)]
/// Errors raised by the fingerprint engine
pub enum FingerprintError {
    /// The group element representation is not supported by the fingerprint engine
    #[error("unsupported group element encoding: {0}")]
    UnsupportedEncoding(&'static str),
    /// A fingerprint serialized into more (or fewer) than one field element
    #[error("fingerprint must fit exactly one field element: expected {expected} bytes, got {got}")]
    InvalidWidth { expected: usize, got: usize },
    /// A limb vector does not match the limb count of its field
    #[error("expected {expected} limbs, got {got}")]
    LimbCount { expected: usize, got: usize },
    #[error("{0}")]
    Serialization(#[from] SerializationError),
}
