//! Configuration management command
//!
//! Provides CLI interface to view and edit the settle configuration.

use anyhow::{Context, Result};
use cli_lib::system_config;
use debounce::MAX_DELAY_MS;
use owo_colors::OwoColorize;

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let config = system_config::load()?;
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "Settle Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!("{}", "[debounce]".yellow());
    println!(
        "  {} = {} {}",
        "delay_ms".cyan(),
        config.debounce.delay_ms,
        format!("({:?})", config.debounce.delay()).dimmed()
    );
    println!(
        "  {} = {}",
        "label".cyan(),
        match &config.debounce.label {
            Some(label) => label.clone(),
            None => "(unset)".dimmed().to_string(),
        }
    );

    println!("\n{}", "[output]".yellow());
    println!(
        "  {} = {}",
        "timestamps".cyan(),
        config.output.timestamps
    );

    println!("\n{}", "Valid Ranges:".bold());
    println!("  delay_ms: 0-{}", MAX_DELAY_MS);

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = system_config::load()?;

    let value = match key {
        "debounce.delay_ms" => config.debounce.delay_ms.to_string(),
        "debounce.label" => config.debounce.label.unwrap_or_default(),
        "output.timestamps" => config.output.timestamps.to_string(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'settle config --list' to see available keys.",
            key
        ),
    };

    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load()?;

    match key {
        "debounce.delay_ms" => {
            let val: u64 = value.parse()
                .context("Invalid value: must be a non-negative integer")?;
            config.debounce.delay_ms = val;
        }
        "debounce.label" => {
            config.debounce.label = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }
        "output.timestamps" => {
            let val: bool = value.parse()
                .context("Invalid value: must be 'true' or 'false'")?;
            config.output.timestamps = val;
        }
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'settle config --list' to see available keys.",
            key
        ),
    }

    // Validate before saving
    config.validate()
        .context("Invalid configuration value")?;

    system_config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create && system_config::init_if_missing()? {
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    print!("{}", system_config::example_config());
    Ok(())
}
