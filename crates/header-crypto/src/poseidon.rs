//! Poseidon parameters for the fingerprint engine. The sponge absorbs elements of the field
//! holding the coordinates of a verifying key.
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::PrimeField;

/// Elements absorbed per permutation
pub const RATE: usize = 4;
/// Capacity of the sponge
pub const CAPACITY: usize = 1;
/// Number of full rounds
pub const FULL_ROUNDS: usize = 8;
/// Number of partial rounds for a width 5 state at alpha 5
pub const PARTIAL_ROUNDS: usize = 60;
/// S-box exponent
pub const ALPHA: u64 = 5;

/// Derives the Poseidon round constants and MDS matrix for `F` with the grain LFSR
pub fn poseidon_config<F: PrimeField>() -> PoseidonConfig<F> {
    let (ark, mds) = find_poseidon_ark_and_mds::<F>(
        F::MODULUS_BIT_SIZE as u64,
        RATE,
        FULL_ROUNDS as u64,
        PARTIAL_ROUNDS as u64,
        0,
    );
    PoseidonConfig::new(FULL_ROUNDS, PARTIAL_ROUNDS, ALPHA, mds, ark, RATE, CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn config_shape() {
        let config = poseidon_config::<Fr>();
        assert_eq!(config.rate, RATE);
        assert_eq!(config.capacity, CAPACITY);
        assert_eq!(config.mds.len(), RATE + CAPACITY);
        assert_eq!(config.ark.len(), FULL_ROUNDS + PARTIAL_ROUNDS);
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = poseidon_config::<Fr>();
        let b = poseidon_config::<Fr>();
        assert_eq!(a.ark, b.ark);
        assert_eq!(a.mds, b.mds);
    }

    #[test]
    fn wide_fields_get_their_own_constants() {
        let config = poseidon_config::<ark_bls12_377::Fq>();
        assert_eq!(config.ark.len(), FULL_ROUNDS + PARTIAL_ROUNDS);
        assert_eq!(config.mds.len(), RATE + CAPACITY);
    }
}
