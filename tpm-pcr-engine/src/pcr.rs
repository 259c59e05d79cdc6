// Copyright 2025 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! PCR digest engine
//!
//! Derives PCR reset values and performs the extend operation. The engine keeps no state between
//! calls, the caller owns the current PCR value and passes it back in.
//!
//! Extending works on the displayed representation of a PCR: the new value is the digest of the
//! current value's hex text followed by the UTF-8 bytes of the input text.

use crate::{algorithm, hasher::Hasher, Error, HashAlgorithm};

/// A fully formed PCR value of a specific bank
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcrValue {
    algorithm: &'static HashAlgorithm,
    digest: Vec<u8>,
    hex: String,
}

impl PcrValue {
    pub(crate) fn zero(algorithm: &'static HashAlgorithm) -> Self {
        Self::from_bytes(algorithm, vec![0u8; algorithm.digest_size()])
    }

    /// TPM2_PCR_Reset analogue for locality bound PCRs: the last byte carries the locality
    pub(crate) fn with_locality(algorithm: &'static HashAlgorithm, locality: Locality) -> Self {
        let mut digest = vec![0u8; algorithm.digest_size()];

        if let Some(last) = digest.last_mut() {
            *last = locality.value();
        }

        Self::from_bytes(algorithm, digest)
    }

    /// Digest of the concatenation of the text fragments
    pub(crate) fn hash(algorithm: &'static HashAlgorithm, fragments: &[&str]) -> Self {
        let mut hasher = Hasher::new(algorithm.digest());

        for fragment in fragments {
            hasher.update_text(fragment);
        }

        Self::from_bytes(algorithm, hasher.finalize().as_ref().to_vec())
    }

    fn from_bytes(algorithm: &'static HashAlgorithm, digest: Vec<u8>) -> Self {
        Self {
            algorithm,
            hex: hex::encode(&digest),
            digest,
        }
    }

    fn parse(algorithm: &'static HashAlgorithm, text: &str) -> Result<Self, Error> {
        let digest = hex::decode(text)
            .ok()
            .filter(|digest| digest.len() == algorithm.digest_size())
            .ok_or_else(|| {
                Error::InvalidEncoding(format!(
                    "expected {} hex characters for {algorithm}, got {text:?}",
                    2 * algorithm.digest_size()
                ))
            })?;

        Ok(Self {
            algorithm,
            digest,
            hex: text.to_string(),
        })
    }

    /// Parses a complete PCR value, keeping the text as given
    pub fn from_hex(name: &str, text: &str) -> Result<Self, Error> {
        Self::parse(algorithm::lookup(name)?, text)
    }

    pub fn algorithm(&self) -> &'static HashAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.digest
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// Extends this value with the input text and returns the new value
    pub fn extend(&self, input_text: &str) -> PcrValue {
        Extension::compute(self.algorithm, &self.hex, input_text).new_value
    }
}

impl std::fmt::Display for PcrValue {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.hex)
    }
}

impl From<PcrValue> for String {
    fn from(pcr: PcrValue) -> Self {
        pcr.hex
    }
}

/// TPM locality, restricted to 0 through 32
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Locality(u8);

impl Locality {
    pub const MAX: u8 = 32;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Locality {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .filter(|value| *value <= Self::MAX)
            .map(Self)
            .ok_or(Error::InvalidLocality(value))
    }
}

impl From<Locality> for u8 {
    fn from(locality: Locality) -> Self {
        locality.0
    }
}

/// Record of a single extend operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extension {
    pub old_value: String,
    pub input: String,
    /// Digest of the input alone, a hash of the empty text for empty input
    pub input_digest: PcrValue,
    pub concatenated: String,
    pub new_value: PcrValue,
}

impl Extension {
    fn compute(algorithm: &'static HashAlgorithm, current_pcr_hex: &str, input_text: &str) -> Self {
        let input_digest = PcrValue::hash(algorithm, &[input_text]);
        let new_value = PcrValue::hash(algorithm, &[current_pcr_hex, input_text]);

        Self {
            old_value: current_pcr_hex.to_string(),
            input: input_text.to_string(),
            input_digest,
            concatenated: [current_pcr_hex, input_text].concat(),
            new_value,
        }
    }
}

/// Reset value of a PCR for the given locality
pub fn zero_digest_with_locality(name: &str, locality: i64) -> Result<PcrValue, Error> {
    let algorithm = algorithm::lookup(name)?;
    let locality = Locality::try_from(locality)?;

    Ok(PcrValue::with_locality(algorithm, locality))
}

/// Reset value of a PCR seeded by an operator supplied value
///
/// Blank seeds give the zero digest. A seed that already is a hex digest of the right length is
/// taken verbatim, any other seed is hashed.
pub fn custom_digest(name: &str, seed: &str) -> Result<PcrValue, Error> {
    let algorithm = algorithm::lookup(name)?;

    if seed.trim().is_empty() {
        return Ok(PcrValue::zero(algorithm));
    }

    if let Ok(pcr) = PcrValue::parse(algorithm, seed) {
        return Ok(pcr);
    }

    Ok(PcrValue::hash(algorithm, &[seed]))
}

/// Digest of the UTF-8 encoding of `text`
pub fn compute_hash(name: &str, text: &str) -> Result<PcrValue, Error> {
    Ok(PcrValue::hash(algorithm::lookup(name)?, &[text]))
}

/// New PCR value after extending `current_pcr_hex` with `input_text`
///
/// The current value is used as text, exactly as displayed, so a value seeded in upper case
/// extends differently from its lower case form. Empty input still extends.
pub fn extend(name: &str, current_pcr_hex: &str, input_text: &str) -> Result<PcrValue, Error> {
    extend_traced(name, current_pcr_hex, input_text).map(|extension| extension.new_value)
}

/// Same as [`extend`], keeping the intermediate values
pub fn extend_traced(
    name: &str,
    current_pcr_hex: &str,
    input_text: &str,
) -> Result<Extension, Error> {
    let algorithm = algorithm::lookup(name)?;

    Ok(Extension::compute(algorithm, current_pcr_hex, input_text))
}
