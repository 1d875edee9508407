// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const PLACEHOLDER_URL: &str = "https://your-project.supabase.co";
pub const PLACEHOLDER_ANON_KEY: &str = "your-anon-key";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub tick_ms: u64,
    pub countdown_ms: u64,
    pub card_columns: u16,
}

fn default_table() -> String {
    "upcoming_releases".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: PLACEHOLDER_URL.to_string(),
            anon_key: PLACEHOLDER_ANON_KEY.to_string(),
            table: default_table(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: 250,
            countdown_ms: 1000,
            card_columns: 3,
        }
    }
}

impl BackendConfig {
    pub fn is_placeholder(&self) -> bool {
        self.url.is_empty()
            || self.url == PLACEHOLDER_URL
            || self.anon_key.is_empty()
            || self.anon_key == PLACEHOLDER_ANON_KEY
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Config {
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Could not load config file, using defaults: {:#}", e);
            Self::default()
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("khmerzoon"))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir()
            .map(|dir| dir.join("config.toml"))
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    pub fn ensure_config_dir() -> Result<PathBuf> {
        let dir = Self::config_dir()?;
        if !dir.exists() {
            fs::create_dir_all(&dir).with_context(|| {
                format!("Failed to create config directory: {}", dir.display())
            })?;
        }
        Ok(dir)
    }

    /// Applies `KHMERZOON_URL` and `KHMERZOON_ANON_KEY` on top of the file.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("KHMERZOON_URL").ok(),
            std::env::var("KHMERZOON_ANON_KEY").ok(),
        );
    }

    fn apply_overrides(&mut self, url: Option<String>, anon_key: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.backend.url = url;
        }
        if let Some(key) = anon_key.filter(|k| !k.trim().is_empty()) {
            self.backend.anon_key = key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.backend.url = "https://khmerzoon.supabase.co".to_string();
        config.backend.anon_key = "key-123".to_string();
        config.ui.card_columns = 4;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.backend.url, "https://khmerzoon.supabase.co");
        assert_eq!(loaded.backend.anon_key, "key-123");
        assert_eq!(loaded.backend.table, "upcoming_releases");
        assert_eq!(loaded.ui.card_columns, 4);
        assert!(!loaded.backend.is_placeholder());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[backend]\nurl = \"http://localhost:54321\"\nanon_key = \"k\"\n\n[ui]\ncountdown_ms = 500\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend.table, "upcoming_releases");
        assert_eq!(config.ui.countdown_ms, 500);
        assert_eq!(config.ui.tick_ms, 250);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("absent.toml"));
        assert!(config.backend.is_placeholder());
    }

    #[test]
    fn overrides_ignore_blank_values() {
        let mut config = Config::default();
        config.apply_overrides(Some("http://127.0.0.1:3000".into()), Some("  ".into()));
        assert_eq!(config.backend.url, "http://127.0.0.1:3000");
        assert_eq!(config.backend.anon_key, PLACEHOLDER_ANON_KEY);
    }
}
