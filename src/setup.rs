// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use chrono::Utc;
use inquire::validator::Validation;
use inquire::{Confirm, Password, PasswordDisplayMode, Text};
use std::path::Path;

use crate::config::{BackendConfig, Config};
use crate::store::RestStore;
use crate::upcoming::fetch_upcoming;

pub async fn interactive_backend_setup(config_path: &Path) -> Result<Config> {
    println!("\n🚀 Welcome to KHMERZOON! Let's connect to the catalog backend.\n");

    println!("You'll need:");
    println!("  • The project URL of the hosted backend");
    println!("  • The public (anon) API key\n");

    let configure = Confirm::new("Would you like to configure the backend now?")
        .with_default(true)
        .prompt()?;

    let mut config = if config_path.exists() {
        Config::load_or_default(config_path)
    } else {
        Config::default()
    };

    if !configure {
        println!("\nYou can configure the backend later by editing:");
        println!("  {}", config_path.display());
        return Ok(config);
    }

    config.backend = prompt_for_backend(&config.backend).await?;
    save_config(&config, config_path)?;

    println!("\n✅ Configuration saved successfully!");
    println!("You can now:");
    println!("  • Run 'khmerzoon' to launch the interactive TUI");
    println!("  • Run 'khmerzoon upcoming' to list upcoming releases");

    Ok(config)
}

async fn prompt_for_backend(current: &BackendConfig) -> Result<BackendConfig> {
    println!("\n📝 Backend Configuration");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━");

    let url = Text::new("Project URL:")
        .with_help_message("e.g., https://your-project.supabase.co")
        .with_validator(|input: &str| {
            if input.is_empty() {
                Ok(Validation::Invalid("Project URL is required".into()))
            } else if !input.starts_with("http://") && !input.starts_with("https://") {
                Ok(Validation::Invalid(
                    "URL must start with http:// or https://".into(),
                ))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;

    let anon_key = Password::new("Anon key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_validator(|input: &str| {
            if input.is_empty() {
                Ok(Validation::Invalid("Anon key is required".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;

    let backend = BackendConfig {
        url,
        anon_key,
        table: current.table.clone(),
    };

    println!("\nTesting connection...");

    if let Err(e) = test_backend_connection(&backend).await {
        println!("⚠️  Warning: Could not verify connection: {:#}", e);
        println!("    The settings will be saved anyway, but you may need to check them.");
    } else {
        println!("✅ Connection successful!");
    }

    Ok(backend)
}

async fn test_backend_connection(backend: &BackendConfig) -> Result<()> {
    let store = RestStore::from_config(backend)?;

    match tokio::time::timeout(
        std::time::Duration::from_secs(10),
        fetch_upcoming(&store, &backend.table, Utc::now()),
    )
    .await
    {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(anyhow::anyhow!("Failed to connect: {:#}", e)),
        Err(_) => Err(anyhow::anyhow!("Connection timeout")),
    }
}

fn save_config(config: &Config, config_path: &Path) -> Result<()> {
    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    if config_path.exists() {
        let backup_path = config_path.with_extension("toml.backup");
        std::fs::copy(config_path, &backup_path)?;
        println!(
            "ℹ️  Existing config backed up to: {}",
            backup_path.display()
        );
    }

    config.save(config_path)?;
    println!("💾 Configuration saved to: {}", config_path.display());

    Ok(())
}

pub fn should_run_setup(config_path: &Path, config: &Config) -> bool {
    !config_path.exists() || config.backend.is_placeholder()
}
