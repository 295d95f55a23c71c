//! Doppler secret location handler.
//!
//! A remote keyed secret entry: the path is the secret name, and the
//! optional `project`/`config` metadata scope the lookup. For a single-value
//! entry the snapshot is the entry's full value.

use async_trait::async_trait;

use super::{LocationHandler, Snapshot};
use crate::backend::doppler_cli;
use crate::error::{LocationErrorKind, Result, ToknError};
use crate::registry::LocationSpec;

pub struct DopplerLocationHandler;

impl DopplerLocationHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DopplerLocationHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationHandler for DopplerLocationHandler {
    async fn read(&self, spec: &LocationSpec) -> Result<String> {
        doppler_cli::get(&spec.path, spec.meta("project"), spec.meta("config"))
            .await
            .map_err(|stderr| {
                let kind = if doppler_cli::is_missing_secret(&stderr) {
                    LocationErrorKind::NotFound
                } else {
                    LocationErrorKind::PermissionDenied
                };
                ToknError::location(spec.to_string(), kind, stderr)
            })
    }

    async fn write(&self, spec: &LocationSpec, value: &str) -> Result<()> {
        doppler_cli::set(&spec.path, value, spec.meta("project"), spec.meta("config"))
            .await
            .map_err(|stderr| {
                ToknError::location(spec.to_string(), LocationErrorKind::WriteFailed, stderr)
            })
    }

    async fn backup(&self, spec: &LocationSpec) -> Result<Snapshot> {
        Ok(Snapshot::new(self.read(spec).await?))
    }

    async fn restore(&self, spec: &LocationSpec, snapshot: &Snapshot) -> Result<()> {
        self.write(spec, snapshot.content()).await
    }
}
