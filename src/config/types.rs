//! Configuration type definitions.

use knuffel::Decode;
use std::path::PathBuf;

/// Expand tilde (~) prefix to the user's home directory.
/// Handles both "~" alone and "~/path/to/something" patterns.
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Main configuration structure parsed from tokn.kdl.
#[derive(Debug, Decode, Clone, Default)]
pub struct Config {
    /// Active metadata backend: "local" or "doppler".
    #[knuffel(child, unwrap(argument))]
    pub backend: Option<String>,

    #[knuffel(child)]
    pub local: Option<LocalSettings>,

    #[knuffel(child)]
    pub doppler: Option<DopplerSettings>,
}

/// Settings for the local filesystem backend.
#[derive(Debug, Decode, Clone, Default)]
pub struct LocalSettings {
    #[knuffel(property(name = "data_dir"))]
    pub data_dir: Option<String>,
}

/// Settings for the Doppler backend.
#[derive(Debug, Decode, Clone, Default)]
pub struct DopplerSettings {
    #[knuffel(property)]
    pub project: Option<String>,

    #[knuffel(property)]
    pub config: Option<String>,
}

impl Config {
    /// Get the active backend name, defaulting to "local".
    pub fn backend(&self) -> String {
        self.backend.clone().unwrap_or_else(|| "local".to_string())
    }

    /// Get the local backend data directory, defaulting to ~/.config/tokn.
    /// Expands ~ to the user's home directory if present.
    pub fn data_dir(&self) -> PathBuf {
        self.local
            .as_ref()
            .and_then(|l| l.data_dir.clone())
            .map(|p| expand_tilde(&p))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config/tokn"))
                    .unwrap_or_else(|| PathBuf::from(".tokn"))
            })
    }

    /// Get the Doppler project for metadata storage, defaulting to "tokn".
    pub fn doppler_project(&self) -> String {
        self.doppler
            .as_ref()
            .and_then(|d| d.project.clone())
            .unwrap_or_else(|| "tokn".to_string())
    }

    /// Get the Doppler config for metadata storage, defaulting to "dev".
    pub fn doppler_config(&self) -> String {
        self.doppler
            .as_ref()
            .and_then(|d| d.config.clone())
            .unwrap_or_else(|| "dev".to_string())
    }

    /// Switch the active backend.
    pub fn set_backend(&mut self, backend: &str) -> Result<(), String> {
        match backend {
            "local" | "doppler" => {
                self.backend = Some(backend.to_string());
                Ok(())
            }
            _ => Err(format!(
                "Unknown backend: {}. Valid backends: local, doppler",
                backend
            )),
        }
    }
}
