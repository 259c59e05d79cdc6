// Copyright 2025 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::session::Session;

/// JSON view of the PCR state, including the trace of any extend operations
#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Report {
    hash_algorithm: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    extensions: Vec<Step>,
    pcr: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct Step {
    old_pcr_value: String,
    input: String,
    input_hash: String,
    concatenated_value: String,
    new_pcr_value: String,
}

impl Report {
    pub(crate) fn new(session: &Session) -> Self {
        Self {
            hash_algorithm: session.algorithm().name(),
            extensions: Vec::new(),
            pcr: session.current_pcr().to_string(),
        }
    }

    pub(crate) fn add_extension(&mut self, extension: tpm_pcr_engine::Extension) {
        self.pcr = extension.new_value.to_string();
        self.extensions.push(Step {
            old_pcr_value: extension.old_value,
            input: extension.input,
            input_hash: extension.input_digest.into(),
            concatenated_value: extension.concatenated,
            new_pcr_value: extension.new_value.into(),
        });
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string_pretty(&self).map_err(|_| std::fmt::Error)?;

        write!(formatter, "{json}")
    }
}
