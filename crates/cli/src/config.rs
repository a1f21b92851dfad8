use anyhow::{Context, Result};
use rtcgit_runtime_config::{CONFIG_FILE_NAME, ConnectorConfig, apply_compat_fallbacks};
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/rtcgit/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("rtcgit"))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load and normalize the config at `path`. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<ConnectorConfig> {
    if !path.exists() {
        return Ok(ConnectorConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let mut config: ConnectorConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config at {}", path.display()))?;
    if apply_compat_fallbacks(&mut config) {
        tracing::debug!("Normalized config values from {}", path.display());
    }
    Ok(config)
}

pub fn load_config() -> Result<ConnectorConfig> {
    load_config_from(&config_path()?)
}

/// Print the effective configuration as TOML.
pub fn show_config() -> Result<()> {
    let path = config_path()?;
    let config = load_config_from(&path)?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    println!("# {source}");
    print!("{rendered}");
    Ok(())
}
