// Copyright 2025 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Simulation of a single TPM Platform Configuration Register
//!
//! Provides the registry of supported PCR bank hash algorithms and a stateless digest engine that
//! derives reset values (plain, locality seeded or custom) and performs the extend operation. All
//! state, like the current PCR value or the selected algorithm, is owned by the caller.

pub mod algorithm;
mod hasher;
pub mod pcr;

pub use algorithm::HashAlgorithm;
pub use pcr::{Extension, Locality, PcrValue};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("invalid locality {0}, expected a value between 0 and 32")]
    InvalidLocality(i64),
    #[error("invalid PCR encoding: {0}")]
    InvalidEncoding(String),
}
