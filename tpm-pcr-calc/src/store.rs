// Copyright 2025 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context as _;

use crate::session::SavedSession;

/// Persists the session across runs as a JSON file
pub(crate) struct SessionStore {
    path: std::path::PathBuf,
}

impl SessionStore {
    pub(crate) fn new(path: std::path::PathBuf) -> Self {
        Self { path }
    }

    /// A missing file means there is no previous session
    pub(crate) fn load(&self) -> anyhow::Result<Option<SavedSession>> {
        let json = match std::fs::read(&self.path) {
            Ok(json) => json,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No session stored in {}", self.path.display());

                return Ok(None);
            }
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("Could not read session from {}", self.path.display())
                });
            }
        };

        let saved = serde_json::from_slice(&json)
            .with_context(|| format!("Could not parse session from {}", self.path.display()))?;

        Ok(Some(saved))
    }

    pub(crate) fn save(&self, saved: &SavedSession) -> anyhow::Result<()> {
        if let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(saved)?;

        std::fs::write(&self.path, json)
            .with_context(|| format!("Could not write session to {}", self.path.display()))?;
        log::debug!("Stored session {saved:?} in {}", self.path.display());

        Ok(())
    }

    pub(crate) fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(error) if error.kind() != std::io::ErrorKind::NotFound => Err(error)
                .with_context(|| format!("Could not remove {}", self.path.display())),
            _ => Ok(()),
        }
    }
}
