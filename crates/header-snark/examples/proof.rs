use ark_std::{end_timer, start_timer};
use header_snark::{prove_chain, trusted_setup, verify_final, RawHeader};
use rand::{rngs::StdRng, SeedableRng};
use std::env;

#[path = "../tests/fixtures.rs"]
mod fixtures;
use fixtures::HEADERS;

use tracing_subscriber::{
    filter::EnvFilter,
    fmt::{time::ChronoUtc, Subscriber},
};

fn main() {
    Subscriber::builder()
        .with_timer(ChronoUtc::rfc3339())
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // optional seed for the setup and the prover
    let seed = env::args()
        .nth(1)
        .map(|s| s.parse().expect("seed must be a number"))
        .unwrap_or(0u64);
    let rng = &mut StdRng::seed_from_u64(seed);

    // Trusted setup
    let time = start_timer!(|| "Trusted setup");
    let params = trusted_setup(rng).unwrap();
    end_timer!(time);

    let headers = HEADERS
        .iter()
        .map(|h| RawHeader::from_hex(h).unwrap())
        .collect::<Vec<_>>();

    // Prover generates the proof given the params
    let time = start_timer!(|| "Generate proof");
    let chain = prove_chain(&params, &headers, rng).unwrap();
    end_timer!(time);

    // Verifier checks the proof
    let time = start_timer!(|| "Verify proof");
    let res = verify_final::<header_snark::backend::Mnt4Backend>(
        chain.vk(&params),
        &chain.proof,
        &chain.witness,
    );
    end_timer!(time);
    assert!(res.is_ok());
    println!("proved {} -> {}", chain.begin, chain.end);
}
