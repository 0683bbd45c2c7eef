use crate::{HeaderError, HASH_LEN, HEADER_LEN, PARENT_HASH_OFFSET};
use sha2::{Digest, Sha256};
use std::{convert::TryFrom, fmt, str::FromStr};

/// A 32 byte block hash in internal byte order, i.e. the order in which it is embedded in
/// the next header
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hash(pub [u8; HASH_LEN]);

impl Hash {
    /// Parses a hash from exactly `HASH_LEN` bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, HeaderError> {
        let inner = <[u8; HASH_LEN]>::try_from(bytes).map_err(|_| HeaderError::InvalidLength {
            expected: HASH_LEN,
            got: bytes.len(),
        })?;
        Ok(Self(inner))
    }

    /// Parses a hash from its hex encoding (internal byte order)
    pub fn from_hex(s: &str) -> Result<Self, HeaderError> {
        Self::from_slice(&hex::decode(s)?)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self)
    }
}

impl FromStr for Hash {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// A serialized block header. Bytes `[4, 36)` hold the hash of the parent header.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawHeader(pub [u8; HEADER_LEN]);

impl RawHeader {
    /// Parses a header from exactly `HEADER_LEN` bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HeaderError> {
        let inner =
            <[u8; HEADER_LEN]>::try_from(bytes).map_err(|_| HeaderError::InvalidLength {
                expected: HEADER_LEN,
                got: bytes.len(),
            })?;
        Ok(Self(inner))
    }

    pub fn from_hex(s: &str) -> Result<Self, HeaderError> {
        Self::from_bytes(&hex::decode(s)?)
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.0
    }

    /// The hash of the previous header, as embedded in this one
    pub fn parent_hash(&self) -> Hash {
        let mut hash = [0u8; HASH_LEN];
        hash.copy_from_slice(&self.0[PARENT_HASH_OFFSET..PARENT_HASH_OFFSET + HASH_LEN]);
        Hash(hash)
    }

    /// The hash of this header, `SHA256(SHA256(header))`
    pub fn hash(&self) -> Hash {
        double_sha256(&self.0)
    }
}

impl fmt::Debug for RawHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHeader({})", hex::encode(&self.0[..]))
    }
}

/// Computes `SHA256(SHA256(message))`
pub fn double_sha256(message: &[u8]) -> Hash {
    let first = Sha256::digest(message);
    let second = Sha256::digest(&first);
    let mut hash = [0u8; HASH_LEN];
    hash.copy_from_slice(&second);
    Hash(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADERS: [&str; 3] = [
        "01000000b5fbf970bf362cc3203d71022d0764ce966a9d5cee7615354e273624000000008c209cca50575be7aad6faf11c26af9d91fc91f9bf953c1e7d4fca44e44be3fa3d286f49ffff001d2e18e5ed",
        "010000003c668f799ca5472fd05b8d43c574469fbec46ae3ffec010cdf6ee31100000000a97c6e691b813753248aa4614e4d3a34a3d1471e6ad863a392ccf4687d857a30f92b6f49ffff001d22239e3b",
        "010000001588b0752fb18960bf8b1728964d091b638e35e3a2c9ed32991da8c300000000cf18302909e57a7687e38d109ff19d01e85fd0f5517ffe821055765193ca51da162f6f49ffff001d16a2ddc4",
    ];

    fn headers() -> Vec<RawHeader> {
        HEADERS
            .iter()
            .map(|h| RawHeader::from_hex(h).unwrap())
            .collect()
    }

    #[test]
    fn headers_are_linked() {
        let headers = headers();
        for pair in headers.windows(2) {
            assert_eq!(pair[0].hash(), pair[1].parent_hash());
        }
    }

    #[test]
    fn hash_matches_known_values() {
        let headers = headers();
        assert_eq!(
            headers[0].parent_hash().to_string(),
            "b5fbf970bf362cc3203d71022d0764ce966a9d5cee7615354e27362400000000"
        );
        assert_eq!(
            headers[2].hash(),
            "acf46b3ddc0abffa740ad7e3ddd37779978aec7b24b51a561e7ae77400000000"
                .parse::<Hash>()
                .unwrap()
        );
    }

    #[test]
    fn rejects_wrong_lengths() {
        match RawHeader::from_bytes(&[0u8; 79]) {
            Err(HeaderError::InvalidLength { expected, got }) => {
                assert_eq!(expected, HEADER_LEN);
                assert_eq!(got, 79);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(RawHeader::from_bytes(&[0u8; 81]).is_err());
        assert!(Hash::from_slice(&[0u8; 31]).is_err());
        assert!(matches!(Hash::from_hex("zz"), Err(HeaderError::Hex(_))));
    }
}
