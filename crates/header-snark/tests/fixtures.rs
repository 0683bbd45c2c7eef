#![allow(dead_code)]
use header_snark::{
    backend::Mnt4Backend, prove_leaf, trusted_setup, ChildProof, Parameters, RawHeader,
};
use once_cell::sync::Lazy;
use rand::{rngs::StdRng, SeedableRng};

/// Three consecutive headers, each embedding the hash of the previous one as its parent
pub const HEADERS: [&str; 3] = [
    "01000000b5fbf970bf362cc3203d71022d0764ce966a9d5cee7615354e273624000000008c209cca50575be7aad6faf11c26af9d91fc91f9bf953c1e7d4fca44e44be3fa3d286f49ffff001d2e18e5ed",
    "010000003c668f799ca5472fd05b8d43c574469fbec46ae3ffec010cdf6ee31100000000a97c6e691b813753248aa4614e4d3a34a3d1471e6ad863a392ccf4687d857a30f92b6f49ffff001d22239e3b",
    "010000001588b0752fb18960bf8b1728964d091b638e35e3a2c9ed32991da8c300000000cf18302909e57a7687e38d109ff19d01e85fd0f5517ffe821055765193ca51da162f6f49ffff001d16a2ddc4",
];

pub const SETUP_SEED: u64 = 0;

pub fn headers() -> Vec<RawHeader> {
    HEADERS
        .iter()
        .map(|h| RawHeader::from_hex(h).unwrap())
        .collect()
}

/// Parameters shared by every test in a binary, from a fixed seed
pub static PARAMS: Lazy<Parameters<Mnt4Backend>> =
    Lazy::new(|| trusted_setup(&mut StdRng::seed_from_u64(SETUP_SEED)).unwrap());

/// A leaf proof of every fixture header, in order
pub static LEAVES: Lazy<Vec<ChildProof<Mnt4Backend>>> = Lazy::new(|| {
    let rng = &mut StdRng::seed_from_u64(1);
    headers()
        .iter()
        .map(|header| {
            let (proof, witness) = prove_leaf(&*PARAMS, header, rng).unwrap();
            ChildProof {
                vk: PARAMS.leaf.vk.clone(),
                proof,
                witness,
            }
        })
        .collect()
});
