use crate::api::VerificationError;
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use header_crypto::{
    Fingerprint, Hash, BEGIN_HASH_OFFSET, END_HASH_OFFSET, FINGERPRINT_OFFSET, HASH_LEN,
    NUM_PUBLIC_INPUTS,
};

/// The public inputs of a leaf or aggregator proof: the begin hash bytes at `[0, 32)`, the
/// end hash bytes at `[32, 64)` and a verifying key fingerprint at `64`
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct PublicWitness<F: PrimeField>(Vec<F>);

impl<F: PrimeField> PublicWitness<F> {
    pub fn new(begin: &Hash, end: &Hash, fingerprint: &Fingerprint<F>) -> Self {
        let mut elements = Vec::with_capacity(NUM_PUBLIC_INPUTS);
        elements.extend(begin.0.iter().map(|b| F::from(*b as u64)));
        elements.extend(end.0.iter().map(|b| F::from(*b as u64)));
        elements.push(fingerprint.scalar());
        Self(elements)
    }

    pub fn as_slice(&self) -> &[F] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn hash_at(&self, offset: usize) -> Result<Hash, VerificationError> {
        let elements = self
            .0
            .get(offset..offset + HASH_LEN)
            .ok_or(VerificationError::MalformedWitness)?;
        let mut hash = Hash::default();
        for (byte, element) in hash.0.iter_mut().zip(elements) {
            let value = element.into_bigint();
            if value.num_bits() > 8 {
                return Err(VerificationError::MalformedWitness);
            }
            *byte = value.as_ref()[0] as u8;
        }
        Ok(hash)
    }

    pub fn begin_hash(&self) -> Result<Hash, VerificationError> {
        self.hash_at(BEGIN_HASH_OFFSET)
    }

    pub fn end_hash(&self) -> Result<Hash, VerificationError> {
        self.hash_at(END_HASH_OFFSET)
    }

    /// The fingerprint slot. Leaves leave it free, aggregators set it to their own key.
    pub fn fingerprint(&self) -> Result<Fingerprint<F>, VerificationError> {
        self.0
            .get(FINGERPRINT_OFFSET)
            .map(|f| Fingerprint(*f))
            .ok_or(VerificationError::MalformedWitness)
    }
}

impl<F: PrimeField> From<Vec<F>> for PublicWitness<F> {
    fn from(elements: Vec<F>) -> Self {
        Self(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field as Fr;

    #[test]
    fn layout() {
        let begin = Hash([1; HASH_LEN]);
        let end = Hash([2; HASH_LEN]);
        let fingerprint = Fingerprint(Fr::from(12345u64));
        let witness = PublicWitness::new(&begin, &end, &fingerprint);

        assert_eq!(witness.len(), NUM_PUBLIC_INPUTS);
        assert_eq!(witness.as_slice()[0], Fr::from(1u64));
        assert_eq!(witness.as_slice()[32], Fr::from(2u64));
        assert_eq!(witness.as_slice()[64], Fr::from(12345u64));
        assert_eq!(witness.begin_hash().unwrap(), begin);
        assert_eq!(witness.end_hash().unwrap(), end);
        assert_eq!(witness.fingerprint().unwrap(), fingerprint);
    }

    #[test]
    fn rejects_non_byte_elements() {
        let mut elements = vec![Fr::from(0u64); NUM_PUBLIC_INPUTS];
        elements[40] = Fr::from(256u64);
        let witness = PublicWitness::from(elements);
        assert!(witness.begin_hash().is_ok());
        assert!(matches!(
            witness.end_hash(),
            Err(VerificationError::MalformedWitness)
        ));
    }

    #[test]
    fn rejects_short_witnesses() {
        let witness = PublicWitness::from(vec![Fr::from(0u64); 40]);
        assert!(witness.begin_hash().is_ok());
        assert!(witness.end_hash().is_err());
        assert!(witness.fingerprint().is_err());
    }
}
