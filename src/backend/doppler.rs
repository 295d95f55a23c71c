//! Doppler-backed metadata storage and CLI plumbing.
//!
//! The whole registry is serialized as one JSON blob under the
//! `TOKN_METADATA` secret in a Doppler project/config, which gives
//! multi-device sync for free. All Doppler access goes through the `doppler`
//! CLI so the user's existing `doppler login` session is reused.

use async_trait::async_trait;
use tokio::process::Command;

use super::MetadataBackend;
use crate::error::{Result, ToknError};
use crate::registry::Registry;

/// Well-known secret name holding the serialized registry.
const METADATA_SECRET: &str = "TOKN_METADATA";

/// Doppler rejects secret values above roughly this size; checked up front
/// so an oversized registry fails loudly instead of being truncated.
const MAX_SECRET_BYTES: usize = 50 * 1024;

/// Run `doppler secrets get NAME --plain`, optionally scoped to a
/// project/config. Returns the trimmed value.
pub(crate) async fn get(
    name: &str,
    project: Option<&str>,
    config: Option<&str>,
) -> std::result::Result<String, String> {
    let mut cmd = Command::new("doppler");
    cmd.args(["secrets", "get", name, "--plain"]);
    scope(&mut cmd, project, config);

    let output = cmd
        .output()
        .await
        .map_err(|e| format!("failed to run doppler CLI: {}", e))?;
    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run `doppler secrets set NAME=VALUE`, optionally scoped.
pub(crate) async fn set(
    name: &str,
    value: &str,
    project: Option<&str>,
    config: Option<&str>,
) -> std::result::Result<(), String> {
    let mut cmd = Command::new("doppler");
    cmd.args(["secrets", "set", &format!("{}={}", name, value), "--silent"]);
    scope(&mut cmd, project, config);

    let output = cmd
        .output()
        .await
        .map_err(|e| format!("failed to run doppler CLI: {}", e))?;
    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }
    Ok(())
}

/// True when a CLI failure means the secret simply does not exist yet, as
/// opposed to an auth or network problem. The Doppler CLI reports this only
/// through its stderr text.
pub(crate) fn is_missing_secret(stderr: &str) -> bool {
    stderr.contains("Could not find requested secret")
}

fn scope(cmd: &mut Command, project: Option<&str>, config: Option<&str>) {
    if let Some(project) = project {
        cmd.args(["--project", project]);
    }
    if let Some(config) = config {
        cmd.args(["--config", config]);
    }
}

pub struct DopplerBackend {
    project: String,
    config: String,
}

impl DopplerBackend {
    pub fn new(project: String, config: String) -> Self {
        Self { project, config }
    }
}

#[async_trait]
impl MetadataBackend for DopplerBackend {
    fn backend_type(&self) -> &'static str {
        "doppler"
    }

    async fn load(&self) -> Result<Registry> {
        let data = match get(
            METADATA_SECRET,
            Some(&self.project),
            Some(&self.config),
        )
        .await
        {
            Ok(data) => data,
            // A project that has never been written has no metadata secret.
            Err(stderr) if is_missing_secret(&stderr) => {
                return Ok(Registry::new());
            }
            Err(stderr) => return Err(ToknError::backend("doppler", stderr)),
        };

        if data.is_empty() {
            return Ok(Registry::new());
        }

        serde_json::from_str(&data)
            .map_err(|e| ToknError::backend("doppler", format!("corrupt registry payload: {}", e)))
    }

    async fn save(&self, registry: &Registry) -> Result<()> {
        let data = serde_json::to_string(registry)?;
        if data.len() > MAX_SECRET_BYTES {
            return Err(ToknError::BackendPayloadTooLarge {
                backend: "doppler".to_string(),
                size: data.len(),
                limit: MAX_SECRET_BYTES,
            });
        }

        set(
            METADATA_SECRET,
            &data,
            Some(&self.project),
            Some(&self.config),
        )
        .await
        .map_err(|stderr| ToknError::backend("doppler", stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{LocationSpec, RotationType, Token};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn oversized_payload_is_rejected_before_any_write() {
        let backend = DopplerBackend::new("tokn".to_string(), "dev".to_string());

        let mut registry = Registry::new();
        // Pad notes until the serialized blob clearly exceeds the ceiling.
        let token = Token {
            service: "other".to_string(),
            rotation_type: RotationType::Manual,
            locations: vec![LocationSpec::new("doppler", "X")],
            expires_at: Utc::now() + Duration::days(30),
            last_rotated_at: None,
            notes: "x".repeat(MAX_SECRET_BYTES),
            extra: Default::default(),
        };
        registry.insert("big", token);

        let err = backend.save(&registry).await.unwrap_err();
        assert!(matches!(err, ToknError::BackendPayloadTooLarge { .. }));
    }

    #[test]
    fn missing_secret_is_distinguished_from_other_failures() {
        assert!(is_missing_secret(
            "Doppler Error: Could not find requested secret 'TOKN_METADATA'"
        ));
        assert!(!is_missing_secret("Doppler Error: Invalid auth token"));
        assert!(!is_missing_secret("failed to run doppler CLI: not found"));
    }
}
