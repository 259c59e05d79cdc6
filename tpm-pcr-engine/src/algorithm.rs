// Copyright 2025 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Registry of the hash algorithms a PCR bank can use

use crate::{Error, PcrValue};

/// Descriptor of a PCR bank hash algorithm
pub struct HashAlgorithm {
    name: &'static str,
    digest: &'static aws_lc_rs::digest::Algorithm,
}

/// Supported algorithms in display order
static ALGORITHMS: [HashAlgorithm; 4] = [
    HashAlgorithm {
        name: "SHA-1",
        digest: &aws_lc_rs::digest::SHA1_FOR_LEGACY_USE_ONLY,
    },
    HashAlgorithm {
        name: "SHA-256",
        digest: &aws_lc_rs::digest::SHA256,
    },
    HashAlgorithm {
        name: "SHA-384",
        digest: &aws_lc_rs::digest::SHA384,
    },
    HashAlgorithm {
        name: "SHA-512",
        digest: &aws_lc_rs::digest::SHA512,
    },
];

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn digest_size(&self) -> usize {
        self.digest.output_len
    }

    pub(crate) fn digest(&self) -> &'static aws_lc_rs::digest::Algorithm {
        self.digest
    }

    /// Whether `name` refers to this algorithm, ignoring case and `-`/`_` separators
    fn matches(&self, name: &str) -> bool {
        let mut expected = self.name.chars().filter(|character| *character != '-');
        let mut actual = name
            .trim()
            .chars()
            .filter(|character| !matches!(character, '-' | '_'));

        loop {
            match (expected.next(), actual.next()) {
                (None, None) => return true,
                (Some(expected), Some(actual)) if expected.eq_ignore_ascii_case(&actual) => (),
                _ => return false,
            }
        }
    }
}

impl std::fmt::Debug for HashAlgorithm {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.name)
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.name)
    }
}

impl PartialEq for HashAlgorithm {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.digest, other.digest)
    }
}

impl Eq for HashAlgorithm {}

impl std::str::FromStr for &'static HashAlgorithm {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        lookup(name)
    }
}

pub fn list() -> &'static [HashAlgorithm] {
    &ALGORITHMS
}

pub fn names() -> impl Iterator<Item = &'static str> {
    ALGORITHMS.iter().map(HashAlgorithm::name)
}

pub fn lookup(name: &str) -> Result<&'static HashAlgorithm, Error> {
    ALGORITHMS
        .iter()
        .find(|algorithm| algorithm.matches(name))
        .ok_or_else(|| Error::UnknownAlgorithm(name.to_string()))
}

pub fn digest_size(name: &str) -> Result<usize, Error> {
    lookup(name).map(HashAlgorithm::digest_size)
}

/// The value of a PCR after a plain reset
pub fn zero_digest(name: &str) -> Result<PcrValue, Error> {
    lookup(name).map(PcrValue::zero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_order_is_stable() {
        let listed = names().collect::<Vec<_>>();

        assert_eq!(listed, ["SHA-1", "SHA-256", "SHA-384", "SHA-512"]);
        assert_eq!(listed, names().collect::<Vec<_>>());
    }

    #[test]
    fn digest_sizes_match_output_length() {
        let sizes = list()
            .iter()
            .map(HashAlgorithm::digest_size)
            .collect::<Vec<_>>();

        assert_eq!(sizes, [20, 32, 48, 64]);
    }

    #[test]
    fn lookup_ignores_case_and_separators() {
        for name in ["SHA-256", "sha256", "Sha_256", " SHA256 "] {
            assert_eq!(lookup(name).map(HashAlgorithm::name), Ok("SHA-256"), "{name}");
        }
    }

    #[test]
    fn lookup_rejects_unknown_names() {
        for name in ["SHA-999", "", "SHA-2566", "SHA-25", "MD5", "SHA-2-5"] {
            assert_eq!(
                lookup(name).map(HashAlgorithm::name),
                Err(Error::UnknownAlgorithm(name.to_string())),
                "{name}"
            );
        }
    }

    #[test]
    fn zero_digest_is_all_zero() {
        let zero = zero_digest("SHA-384").unwrap();

        assert_eq!(zero.as_str(), "0".repeat(96));
        assert_eq!(digest_size("SHA-1"), Ok(20));
    }

    #[test]
    fn parse_through_from_str() {
        let algorithm: &HashAlgorithm = "sha512".parse().unwrap();

        assert_eq!(algorithm, &list()[3]);
    }
}
