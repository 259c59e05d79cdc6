// Copyright 2025 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

mod report;
mod session;
mod store;

use anyhow::Context as _;
use report::Report;
use session::Session;
use store::SessionStore;
use tpm_pcr_engine::{algorithm, pcr, HashAlgorithm};

/// Simulate a TPM PCR: reset it to a locality or custom startup value and extend it
#[derive(clap::Parser)]
struct Arguments {
    /// Path of the persisted session (selected algorithm, PCR value and startup value)
    #[arg(
        long,
        env = "TPM_PCR_CALC_CONFIG",
        default_value = "tpm-pcr-calc.json",
        global = true
    )]
    config: std::path::PathBuf,
    /// PCR bank hash algorithm (SHA-1, SHA-256, SHA-384 or SHA-512)
    #[arg(
        long,
        short,
        default_value = "SHA-256",
        value_parser = algorithm::lookup,
        global = true
    )]
    algorithm: &'static HashAlgorithm,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List the supported PCR bank hash algorithms and their digest sizes
    Algorithms,
    /// Reset the PCR to the startup value
    Reset,
    /// Print the digest of a text
    Hash { text: String },
    /// Extend the PCR with each input in order
    ///
    /// Every extend hashes the current PCR value, as hex text, concatenated with the input text.
    Extend {
        /// PCR value to start from instead of the persisted one
        #[arg(long)]
        pcr: Option<String>,
        #[arg(required = true)]
        input: Vec<String>,
    },
    /// Manage the startup value a reset restores
    #[command(subcommand)]
    Startup(StartupCommand),
}

#[derive(clap::Subcommand)]
enum StartupCommand {
    /// Print the stored startup value
    Show,
    /// Reset to a zero digest whose last byte is the locality (0 to 32)
    Locality {
        #[arg(allow_negative_numbers = true)]
        locality: i64,
    },
    /// Reset to a custom value
    ///
    /// A hex digest of the bank's size is used as is, any other text is hashed and an empty value
    /// resets to the zero digest.
    Custom { value: String },
    /// Remove the persisted session, including the startup value
    Clear,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let arguments: Arguments = clap::Parser::parse();

    println!("{}", run(arguments)?);

    Ok(())
}

fn run(arguments: Arguments) -> anyhow::Result<String> {
    let store = SessionStore::new(arguments.config);
    let algorithm = arguments.algorithm;

    // Commands that do not touch the persisted session
    let command = match arguments.command {
        Command::Algorithms => {
            return Ok(algorithm::list()
                .iter()
                .map(|algorithm| format!("{algorithm}\t{}", algorithm.digest_size()))
                .collect::<Vec<_>>()
                .join("\n"));
        }
        Command::Hash { text } => {
            return Ok(pcr::compute_hash(algorithm.name(), &text)?.to_string());
        }
        Command::Startup(StartupCommand::Clear) => {
            store.clear()?;

            return Ok(Report::new(&Session::new(algorithm, None)?).to_string());
        }
        command => command,
    };

    let mut session = Session::resume(algorithm, store.load()?)?;
    let output = match command {
        Command::Reset => {
            session.reset()?;

            Report::new(&session).to_string()
        }
        Command::Extend { pcr, input } => {
            if let Some(pcr) = pcr {
                session
                    .restore_pcr(&pcr)
                    .context("Could not use the provided PCR value")?;
            }

            let mut report = Report::new(&session);

            for input in input {
                report.add_extension(session.extend(&input)?);
            }

            report.to_string()
        }
        Command::Startup(StartupCommand::Show) => {
            return Ok(serde_json::to_string_pretty(&session.startup())?);
        }
        Command::Startup(StartupCommand::Locality { locality }) => {
            session.set_startup_locality(locality)?;

            Report::new(&session).to_string()
        }
        Command::Startup(StartupCommand::Custom { value }) => {
            session.set_startup_custom(&value)?;

            Report::new(&session).to_string()
        }
        Command::Algorithms | Command::Hash { .. } | Command::Startup(StartupCommand::Clear) => {
            unreachable!()
        }
    };

    store.save(&session.to_saved())?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA256_ZERO_ABC: &str = "b64374d04ef9c4f39fddb1e0d6be38a0130f6c057fc0f4ee467ea0e18bc758f1";
    const SHA256_ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    struct Calculator {
        directory: tempfile::TempDir,
    }

    impl Calculator {
        fn new() -> Self {
            Self {
                directory: tempfile::tempdir().unwrap(),
            }
        }

        fn config(&self) -> std::path::PathBuf {
            self.directory.path().join("session.json")
        }

        fn run(&self, arguments: &[&str]) -> anyhow::Result<String> {
            let config = self.config();
            let arguments = <Arguments as clap::Parser>::try_parse_from(
                ["tpm-pcr-calc", "--config", config.to_str().unwrap()]
                    .into_iter()
                    .chain(arguments.iter().copied()),
            )?;

            run(arguments)
        }

        fn pcr(&self, arguments: &[&str]) -> String {
            let report: serde_json::Value =
                serde_json::from_str(&self.run(arguments).unwrap()).unwrap();

            report["Pcr"].as_str().unwrap().to_string()
        }

        fn saved(&self) -> serde_json::Value {
            serde_json::from_slice(&std::fs::read(self.config()).unwrap()).unwrap()
        }
    }

    fn engine_error(error: anyhow::Error) -> tpm_pcr_engine::Error {
        error.downcast().unwrap()
    }

    #[test]
    fn rejected_locality_keeps_the_stored_session() {
        let calculator = Calculator::new();

        calculator.run(&["startup", "locality", "3"]).unwrap();
        let stored = std::fs::read(calculator.config()).unwrap();

        for locality in ["40", "-1"] {
            let error = calculator
                .run(&["startup", "locality", locality])
                .unwrap_err();

            assert_eq!(
                engine_error(error),
                tpm_pcr_engine::Error::InvalidLocality(locality.parse().unwrap())
            );
            assert_eq!(std::fs::read(calculator.config()).unwrap(), stored);
        }
    }

    #[test]
    fn custom_value_replaces_locality() {
        let calculator = Calculator::new();

        calculator.run(&["startup", "locality", "3"]).unwrap();

        assert_eq!(calculator.pcr(&["startup", "custom", "  abc "]), SHA256_ABC);
        assert_eq!(
            calculator.saved()["Startup"],
            serde_json::json!({ "StartupType": "Custom", "CustomPcrValue": "abc" })
        );

        let shown: serde_json::Value =
            serde_json::from_str(&calculator.run(&["startup", "show"]).unwrap()).unwrap();

        assert_eq!(shown, calculator.saved()["Startup"]);
    }

    #[test]
    fn clear_removes_the_stored_session() {
        let calculator = Calculator::new();

        calculator.run(&["startup", "locality", "3"]).unwrap();

        assert!(calculator.config().exists());
        assert_eq!(calculator.pcr(&["startup", "clear"]), "0".repeat(64));
        assert!(!calculator.config().exists());
        assert_eq!(calculator.run(&["startup", "show"]).unwrap(), "null");
    }

    #[test]
    fn extend_continues_across_runs() {
        let calculator = Calculator::new();

        assert_eq!(calculator.pcr(&["extend", "abc"]), SHA256_ZERO_ABC);
        assert_eq!(
            calculator.pcr(&["extend", "def"]),
            "6a55df6c31276f8dc0d2911d56c79a7ece3722f3e3900d2d73f8fd9b226c756f"
        );
        assert_eq!(calculator.pcr(&["reset"]), "0".repeat(64));
        assert_eq!(calculator.saved()["Pcr"], "0".repeat(64));
    }

    #[test]
    fn extend_from_provided_pcr() {
        let calculator = Calculator::new();
        let zero = "0".repeat(64);

        calculator.run(&["extend", "abc"]).unwrap();

        assert_eq!(
            calculator.pcr(&["extend", "--pcr", zero.as_str(), "abc"]),
            SHA256_ZERO_ABC
        );
        assert!(calculator.run(&["extend", "--pcr", "00", "abc"]).is_err());
    }

    #[test]
    fn switching_algorithm_resets_the_pcr() {
        let calculator = Calculator::new();

        calculator.run(&["startup", "locality", "1"]).unwrap();
        calculator.run(&["extend", "abc"]).unwrap();

        assert_eq!(
            calculator.pcr(&["-a", "SHA-1", "reset"]),
            format!("{}01", "0".repeat(38))
        );
        assert_eq!(calculator.saved()["SelectedHashAlgorithm"], "SHA-1");

        // same algorithm again keeps the extended value
        let extended = calculator.pcr(&["-a", "sha1", "extend", "abc"]);

        assert_eq!(calculator.saved()["Pcr"], extended);
    }

    #[test]
    fn stateless_commands() {
        let calculator = Calculator::new();

        assert_eq!(
            calculator.run(&["algorithms"]).unwrap(),
            "SHA-1\t20\nSHA-256\t32\nSHA-384\t48\nSHA-512\t64"
        );
        assert_eq!(calculator.run(&["hash", "abc"]).unwrap(), SHA256_ABC);
        assert!(!calculator.config().exists());
        assert!(calculator.run(&["-a", "SHA-999", "algorithms"]).is_err());
    }
}
