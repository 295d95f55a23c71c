//! Local file-based metadata storage.
//!
//! Stores the registry as JSON under the configured data directory
//! (default `~/.config/tokn/registry.json`). Works offline with no external
//! dependencies.

use std::path::PathBuf;

use async_trait::async_trait;

use super::MetadataBackend;
use crate::error::{Result, ToknError};
use crate::registry::Registry;
use crate::utils::restrict_file_permissions;

const REGISTRY_FILENAME: &str = "registry.json";

pub struct LocalBackend {
    data_dir: PathBuf,
}

impl LocalBackend {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join(REGISTRY_FILENAME)
    }
}

#[async_trait]
impl MetadataBackend for LocalBackend {
    fn backend_type(&self) -> &'static str {
        "local"
    }

    async fn load(&self) -> Result<Registry> {
        let path = self.registry_path();
        if !path.exists() {
            return Ok(Registry::new());
        }

        let data = std::fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|e| {
            ToknError::backend(
                "local",
                format!("corrupt registry at {}: {}", path.display(), e),
            )
        })
    }

    async fn save(&self, registry: &Registry) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;

        let path = self.registry_path();
        let data = serde_json::to_string_pretty(registry)?;
        std::fs::write(&path, data)?;
        restrict_file_permissions(&path)?;
        Ok(())
    }
}
