// Configuration loader
// Loads settings from ~/.solace/config.toml or the environment

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use super::settings::Config;

/// Load configuration from the Solace config file or environment.
///
/// Lookup order: `~/.solace/config.toml`, then the `GEMINI_API_KEY`
/// environment variable with defaults for everything else.
pub fn load_config() -> Result<Config> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let config_path = home.join(".solace/config.toml");

    if config_path.exists() {
        return load_from_file(&config_path);
    }

    if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
        if !api_key.is_empty() {
            return Ok(Config::from_api_key(api_key));
        }
    }

    // No config found - point the user at the two setup paths
    bail!(
        "No configuration found. Create ~/.solace/config.toml:\n\n\
        [gemini]\n\
        api_key = \"...\"\n\n\
        Alternatively, set the environment variable:\n\
        export GEMINI_API_KEY=\"...\""
    );
}

/// Parse a config file at an explicit path.
pub fn load_from_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if config.gemini.api_key.is_empty() {
        bail!("Config at {} has an empty gemini.api_key", path.display());
    }

    Ok(config)
}
