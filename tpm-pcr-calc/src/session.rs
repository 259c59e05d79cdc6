// Copyright 2025 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The calculator keeps the current PCR value and the selected bank between operations, while the
//! digest engine itself is stateless. A reset restores the configured startup value, which is
//! either a locality or a custom seed.

use tpm_pcr_engine::{algorithm, pcr, Error, Extension, HashAlgorithm, PcrValue};

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "StartupType")]
pub(crate) enum Startup {
    Locality {
        #[serde(rename = "InitialPcrValue")]
        locality: i64,
    },
    Custom {
        #[serde(rename = "CustomPcrValue")]
        value: String,
    },
}

impl Startup {
    fn pcr(&self, algorithm: &HashAlgorithm) -> Result<PcrValue, Error> {
        match self {
            Startup::Locality { locality } => {
                pcr::zero_digest_with_locality(algorithm.name(), *locality)
            }
            Startup::Custom { value } => pcr::custom_digest(algorithm.name(), value),
        }
    }
}

/// Session state kept between runs
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SavedSession {
    selected_hash_algorithm: String,
    pcr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    startup: Option<Startup>,
}

pub(crate) struct Session {
    algorithm: &'static HashAlgorithm,
    current_pcr: String,
    startup: Option<Startup>,
}

impl Session {
    pub(crate) fn new(
        algorithm: &'static HashAlgorithm,
        startup: Option<Startup>,
    ) -> Result<Self, Error> {
        let mut session = Self {
            algorithm,
            current_pcr: String::new(),
            startup,
        };

        session.reset()?;

        Ok(session)
    }

    /// Continues a saved session, then switches to `algorithm`
    ///
    /// A saved PCR that no longer parses is dropped in favour of the startup value.
    pub(crate) fn resume(
        algorithm: &'static HashAlgorithm,
        saved: Option<SavedSession>,
    ) -> Result<Self, Error> {
        let Some(saved) = saved else {
            return Self::new(algorithm, None);
        };

        let selected = match algorithm::lookup(&saved.selected_hash_algorithm) {
            Ok(selected) => selected,
            Err(error) => {
                log::warn!("Ignoring saved PCR value: {error}");

                return Self::new(algorithm, saved.startup);
            }
        };
        let mut session = Self::new(selected, saved.startup)?;

        if let Err(error) = session.restore_pcr(&saved.pcr) {
            log::warn!("[{selected}] Ignoring saved PCR value: {error}");
        }

        session.select_algorithm(algorithm)?;

        Ok(session)
    }

    pub(crate) fn to_saved(&self) -> SavedSession {
        SavedSession {
            selected_hash_algorithm: self.algorithm.name().to_string(),
            pcr: self.current_pcr.clone(),
            startup: self.startup.clone(),
        }
    }

    pub(crate) fn algorithm(&self) -> &'static HashAlgorithm {
        self.algorithm
    }

    pub(crate) fn current_pcr(&self) -> &str {
        &self.current_pcr
    }

    pub(crate) fn startup(&self) -> Option<&Startup> {
        self.startup.as_ref()
    }

    /// Switching to another bank resets the PCR
    pub(crate) fn select_algorithm(
        &mut self,
        algorithm: &'static HashAlgorithm,
    ) -> Result<(), Error> {
        if self.algorithm == algorithm {
            return Ok(());
        }

        self.algorithm = algorithm;
        self.reset()
    }

    /// Restores the startup value, or the zero digest if the startup value does not apply
    pub(crate) fn reset(&mut self) -> Result<(), Error> {
        let startup_pcr = self
            .startup
            .as_ref()
            .map(|startup| startup.pcr(self.algorithm))
            .transpose();
        let pcr = match startup_pcr {
            Ok(Some(pcr)) => pcr,
            Ok(None) => algorithm::zero_digest(self.algorithm.name())?,
            Err(error) => {
                log::warn!(
                    "[{}] Startup value {:?} not applicable, falling back to zero digest: {error}",
                    self.algorithm,
                    self.startup
                );

                algorithm::zero_digest(self.algorithm.name())?
            }
        };

        log::debug!("[{}] RESET: {pcr}", self.algorithm);
        self.current_pcr = pcr.into();

        Ok(())
    }

    /// Continues from a previously displayed PCR value
    pub(crate) fn restore_pcr(&mut self, text: &str) -> Result<(), Error> {
        let pcr = PcrValue::from_hex(self.algorithm.name(), text.trim())?;

        log::debug!("[{}] RESTORE: {pcr}", self.algorithm);
        self.current_pcr = pcr.into();

        Ok(())
    }

    /// Validates the locality, then makes it the startup value and resets the PCR to it
    pub(crate) fn set_startup_locality(&mut self, locality: i64) -> Result<(), Error> {
        let pcr = pcr::zero_digest_with_locality(self.algorithm.name(), locality)?;

        log::debug!("[{}] STARTUP LOCALITY {locality}: {pcr}", self.algorithm);
        self.startup = Some(Startup::Locality { locality });
        self.current_pcr = pcr.into();

        Ok(())
    }

    /// Makes the trimmed custom value the startup value and resets the PCR to it
    pub(crate) fn set_startup_custom(&mut self, value: &str) -> Result<(), Error> {
        let value = value.trim();
        let pcr = pcr::custom_digest(self.algorithm.name(), value)?;

        log::debug!("[{}] STARTUP CUSTOM {value:?}: {pcr}", self.algorithm);
        self.startup = Some(Startup::Custom {
            value: value.to_string(),
        });
        self.current_pcr = pcr.into();

        Ok(())
    }

    pub(crate) fn extend(&mut self, input: &str) -> Result<Extension, Error> {
        let extension = pcr::extend_traced(self.algorithm.name(), &self.current_pcr, input)?;

        log::debug!(
            "[{}] EXTEND {input:?} (input hash {}): {}",
            self.algorithm,
            extension.input_digest,
            extension.new_value
        );
        self.current_pcr = extension.new_value.to_string();

        Ok(extension)
    }
}
