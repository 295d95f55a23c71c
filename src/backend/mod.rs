//! Metadata backends - durable storage for the token registry.
//!
//! Backends persist registry metadata only, never credential values. The
//! registry travels as a single JSON blob: a file for the local backend, one
//! well-known secret entry for the Doppler backend.

pub(crate) mod doppler;
mod local;

pub(crate) use self::doppler as doppler_cli;
pub use doppler::DopplerBackend;
pub use local::LocalBackend;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{Result, ToknError};
use crate::registry::Registry;

#[async_trait]
pub trait MetadataBackend: Send + Sync {
    /// Backend type identifier ("local", "doppler").
    fn backend_type(&self) -> &'static str;

    /// Load the registry. A store that has never been written yields an
    /// empty registry; a corrupt payload is an error, never a silent reset.
    async fn load(&self) -> Result<Registry>;

    async fn save(&self, registry: &Registry) -> Result<()>;
}

/// Build the backend selected by the config, or by an explicit override.
pub fn backend_for(config: &Config, override_type: Option<&str>) -> Result<Box<dyn MetadataBackend>> {
    let backend_type = override_type
        .map(str::to_string)
        .unwrap_or_else(|| config.backend());

    match backend_type.as_str() {
        "local" => Ok(Box::new(LocalBackend::new(config.data_dir()))),
        "doppler" => Ok(Box::new(DopplerBackend::new(
            config.doppler_project(),
            config.doppler_config(),
        ))),
        other => Err(ToknError::config(format!(
            "Unknown backend type: {}. Supported backends: local, doppler",
            other
        ))),
    }
}

/// Copy the full registry from one backend to another.
///
/// Non-destructive: the source is left intact. The migration only counts as
/// successful once the destination loads back a registry equal to the
/// source's. Returns the number of tokens migrated.
pub async fn migrate(
    source: &dyn MetadataBackend,
    dest: &dyn MetadataBackend,
) -> Result<usize> {
    let registry = source.load().await?;
    if registry.is_empty() {
        return Err(ToknError::backend(
            source.backend_type(),
            "no tokens to migrate",
        ));
    }

    dest.save(&registry).await?;

    let readback = dest.load().await?;
    if readback != registry {
        return Err(ToknError::backend(
            dest.backend_type(),
            "migration verification failed: destination registry does not match source",
        ));
    }

    Ok(registry.len())
}
