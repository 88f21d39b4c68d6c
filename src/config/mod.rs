mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = ["./seasonmux.toml", "~/.config/seasonmux/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration. Only presence is checked; paths are checked when
/// a run starts.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.naming.base_name.trim().is_empty() {
        anyhow::bail!("Output base name cannot be empty");
    }

    if config.naming.season.trim().is_empty() {
        anyhow::bail!("Season cannot be empty");
    }

    if !config.naming.template.contains("{episode}") {
        tracing::warn!(
            "Output template {:?} has no {{episode}} variable; every episode will write the same file",
            config.naming.template
        );
    }

    if config.classify.container_extensions.is_empty() {
        anyhow::bail!("At least one container extension is required");
    }

    if config.run.jobs == Some(0) {
        anyhow::bail!("Worker count cannot be 0");
    }

    if config.tools.timeout_secs == Some(0) {
        anyhow::bail!("Tool timeout cannot be 0 seconds");
    }

    Ok(())
}
