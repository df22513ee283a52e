//! CLI configuration utilities

use anyhow::{Context, Result};
use std::path::Path;
use tollgate_core::{ClientConfig, StateDir};

/// Load the client configuration for this invocation
///
/// An explicit `path` must exist; otherwise the state directory's
/// `config.json` is used when present. `base_url` overrides whatever the
/// layers produced.
pub fn load_client_config(
    state: &StateDir,
    path: Option<&Path>,
    base_url: Option<&str>,
) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ClientConfig::load(state.config_path())?,
    };

    if let Some(base_url) = base_url {
        config.base_url = base_url.to_string();
        config.validate()?;
    }

    Ok(config)
}

/// Generate a default configuration file
pub fn generate_default_config(path: &Path) -> Result<()> {
    ClientConfig::default().save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::with_override(dir.path());
        generate_default_config(&state.config_path()).unwrap();

        let config = load_client_config(&state, Some(&state.config_path()), None).unwrap();
        assert_eq!(config.base_url, ClientConfig::default().base_url);
    }

    #[test]
    fn test_base_url_override() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::with_override(dir.path());

        let config =
            load_client_config(&state, None, Some("https://api.example.com/")).unwrap();
        assert_eq!(config.base_url, "https://api.example.com/");

        assert!(load_client_config(&state, None, Some("ftp://example.com/")).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::with_override(dir.path());
        let missing = dir.path().join("missing.json");

        assert!(load_client_config(&state, Some(&missing), None).is_err());
    }
}
