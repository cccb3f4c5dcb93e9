//! Content digests recorded for every archived document

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh3::{xxh3_64, xxh3_128};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "sha512")]
    Sha512,
    #[serde(rename = "xxh3_64")]
    Xxh3_64,
    #[serde(rename = "xxh3_128")]
    Xxh3_128,
}

impl DigestAlgorithm {
    /// Every supported algorithm, in digest-file column order.
    pub const ALL: [DigestAlgorithm; 4] = [
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha512,
        DigestAlgorithm::Xxh3_64,
        DigestAlgorithm::Xxh3_128,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
            DigestAlgorithm::Xxh3_64 => "xxh3_64",
            DigestAlgorithm::Xxh3_128 => "xxh3_128",
        }
    }

    /// Lowercase hex digest of `bytes`.
    #[must_use]
    pub fn hex_digest(self, bytes: &[u8]) -> String {
        match self {
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            DigestAlgorithm::Sha512 => hex::encode(Sha512::digest(bytes)),
            DigestAlgorithm::Xxh3_64 => hex::encode(xxh3_64(bytes).to_be_bytes()),
            DigestAlgorithm::Xxh3_128 => hex::encode(xxh3_128(bytes).to_be_bytes()),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown digest algorithm '{s}'"))
    }
}

/// Digests of `bytes` for each algorithm, in the order given.
#[must_use]
pub fn digest_all(algorithms: &[DigestAlgorithm], bytes: &[u8]) -> Vec<String> {
    algorithms
        .par_iter()
        .map(|algorithm| algorithm.hex_digest(bytes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_sha256() {
        assert_eq!(
            DigestAlgorithm::Sha256.hex_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(DigestAlgorithm::Xxh3_64.hex_digest(b"abc").len(), 16);
        assert_eq!(DigestAlgorithm::Xxh3_128.hex_digest(b"abc").len(), 32);
        assert_eq!(DigestAlgorithm::Sha512.hex_digest(b"").len(), 128);
    }

    #[test]
    fn test_names_round_trip() {
        for algorithm in DigestAlgorithm::ALL {
            assert_eq!(algorithm.name().parse::<DigestAlgorithm>(), Ok(algorithm));
        }
        assert!("md5".parse::<DigestAlgorithm>().is_err());
    }

    proptest! {
        #[test]
        fn digests_are_deterministic(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let first = digest_all(&DigestAlgorithm::ALL, &bytes);
            let second = digest_all(&DigestAlgorithm::ALL, &bytes);
            prop_assert_eq!(&first, &second);
            for (digest, algorithm) in first.iter().zip(DigestAlgorithm::ALL) {
                prop_assert_eq!(digest, &algorithm.hex_digest(&bytes));
                prop_assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
            }
        }
    }
}
