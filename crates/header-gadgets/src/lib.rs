//! # Header Gadgets
//!
//! R1CS gadgets for header-chain proofs: recomposition of emulated field elements, the double
//! SHA-256 of a header, and the in-circuit verifying key fingerprint.

mod emulated;
pub use emulated::{canonicalize, enforce_bit_length, le_bits, EmulatedVar};

mod hash;
pub use hash::{bytes_to_fp, double_sha256, HashVar};

mod fingerprint;
pub use fingerprint::{GroupElementVar, VerifyingKeyRecordVar};

mod witness;
pub use witness::PublicWitnessVar;

/// Utility functions which do not involve generating constraints
pub mod utils;
