// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use khmerzoon::{Config, MemoryStore, RemoteStore, RestStore};

pub mod countdown;
pub mod upcoming;

pub use countdown::CountdownCommand;
pub use upcoming::UpcomingCommand;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid format: {}. Use 'text' or 'json'", s),
        }
    }
}

/// Context for command execution with backend selection
pub struct CommandContext {
    pub config: Config,
    pub fixture: Option<PathBuf>,
}

impl CommandContext {
    pub fn new(config: Config, fixture: Option<PathBuf>) -> Self {
        Self { config, fixture }
    }

    pub fn table(&self) -> &str {
        &self.config.backend.table
    }

    /// The fixture file when one was given, otherwise the configured backend
    pub fn store(&self, show_progress: bool) -> Result<Arc<dyn RemoteStore>> {
        if let Some(path) = &self.fixture {
            tracing::debug!("Using fixture rows from {}", path.display());
            return Ok(Arc::new(MemoryStore::load_fixture(self.table(), path)?));
        }

        if self.config.backend.is_placeholder() {
            anyhow::bail!(
                "No backend configured. Run 'khmerzoon setup' or set KHMERZOON_URL and KHMERZOON_ANON_KEY."
            );
        }

        let mut store = RestStore::from_config(&self.config.backend)?;
        if show_progress {
            store.enable_progress();
        }
        Ok(Arc::new(store))
    }
}
