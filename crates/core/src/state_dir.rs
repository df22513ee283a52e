//! Platform-specific state directory management

use crate::CoreResult;
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Environment variable overriding the platform directories
pub const STATE_DIR_ENV: &str = "TOLLGATE_STATE_DIR";

/// Manages platform-specific application directories
#[derive(Debug)]
pub struct StateDir {
    /// Project directories from the directories crate
    project_dirs: Option<ProjectDirs>,
    /// Override directory for testing or custom installations
    override_dir: Option<PathBuf>,
}

impl StateDir {
    /// Create a new StateDir instance, honouring `TOLLGATE_STATE_DIR`
    pub fn new() -> Self {
        if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
            return Self::with_override(dir);
        }

        let project_dirs = ProjectDirs::from("dev", "Tollgate", "tollgate");
        if project_dirs.is_none() {
            warn!("Failed to determine platform-specific directories, will use fallback");
        }
        Self {
            project_dirs,
            override_dir: None,
        }
    }

    /// Create a new StateDir with an override directory
    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            project_dirs: None,
            override_dir: Some(path.into()),
        }
    }

    /// Get the configuration directory
    pub fn config_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.join("config");
        }

        if let Some(project_dirs) = &self.project_dirs {
            project_dirs.config_dir().to_path_buf()
        } else {
            // Fallback to current directory
            PathBuf::from("./config")
        }
    }

    /// Get the data directory for persistent storage
    pub fn data_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.join("data");
        }

        if let Some(project_dirs) = &self.project_dirs {
            project_dirs.data_dir().to_path_buf()
        } else {
            // Fallback to current directory
            PathBuf::from("./data")
        }
    }

    /// Get the config path
    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join("config.json")
    }

    /// Get the path of the persisted token file
    pub fn tokens_path(&self) -> PathBuf {
        self.data_dir().join("tokens.json")
    }

    /// Create all required directories
    pub fn create_directories(&self) -> CoreResult<()> {
        for dir in [self.config_dir(), self.data_dir()] {
            std::fs::create_dir_all(&dir)?;
            debug!("Ensured directory exists: {}", dir.display());
        }

        debug!("Using state directories:");
        debug!("  Config: {}", self.config_dir().display());
        debug!("  Data: {}", self.data_dir().display());

        Ok(())
    }
}

impl Default for StateDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_override_directory() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = StateDir::with_override(temp_dir.path());

        assert_eq!(state_dir.config_dir(), temp_dir.path().join("config"));
        assert_eq!(state_dir.data_dir(), temp_dir.path().join("data"));
        assert_eq!(
            state_dir.tokens_path(),
            temp_dir.path().join("data").join("tokens.json")
        );
        assert_eq!(
            state_dir.config_path(),
            temp_dir.path().join("config").join("config.json")
        );
    }

    #[test]
    fn test_create_directories() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = StateDir::with_override(temp_dir.path());

        state_dir.create_directories().unwrap();

        assert!(state_dir.config_dir().exists());
        assert!(state_dir.data_dir().exists());
    }
}
