mod types;

pub use types::*;

use crate::output::SegmentNamer;
use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config).with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./mp4split.toml",
        "~/.config/mp4split/config.toml",
        "/etc/mp4split/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    SegmentNamer::from_config(&config.split)?;

    if config.split.track_ids.contains(&0) {
        anyhow::bail!("Track id 0 is reserved and cannot be filtered on");
    }

    if config.split.output_dir.is_file() {
        anyhow::bail!(
            "Output path is a file, not a directory: {:?}",
            config.split.output_dir
        );
    }

    Ok(())
}
