//! Settings storage for the phone system endpoint

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::endpoint::EndpointConfig;
use crate::error::DialError;

/// Persisted settings, as written to `config.toml`.
///
/// Keys written by the browser add-on (`doNotPrompt`, `callingDevice`) are
/// accepted as aliases so an exported settings file can be dropped in.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Call URL template containing a `{number}` placeholder
    pub url: Option<String>,
    /// Basic auth user
    pub user: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
    /// Call without asking when a number arrives via launch parameter
    #[serde(default, alias = "doNotPrompt")]
    pub do_not_prompt: bool,
    /// Device identifier passed along with call requests
    #[serde(alias = "callingDevice")]
    pub calling_device: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ch", "dialbridge", "dialbridge")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Default config file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Directory for log files written while the dialer owns the terminal
    pub fn cache_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ch", "dialbridge", "dialbridge")
            .context("Could not determine cache directory")?;
        Ok(proj_dirs.cache_dir().to_path_buf())
    }

    /// Load settings from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save settings to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains the password)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    /// Validate into an endpoint description. Fails before any request is made.
    pub fn endpoint(&self) -> Result<EndpointConfig, DialError> {
        let url = self.url.as_deref().ok_or_else(|| {
            DialError::Configuration(
                "phone system URL not set. Run 'dialbridge config set --url <url>'.".to_string(),
            )
        })?;

        EndpointConfig::new(
            url,
            self.user.clone().filter(|u| !u.is_empty()),
            self.password.clone(),
            self.do_not_prompt,
            self.calling_device.clone().filter(|d| !d.is_empty()),
        )
    }

    /// Copy of these settings safe to print.
    pub fn redacted(&self) -> Self {
        Self {
            password: self.password.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}
