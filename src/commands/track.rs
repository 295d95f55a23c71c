//! Track command handler - start tracking a token.

use chrono::{Duration, Utc};

use crate::backend::MetadataBackend;
use crate::error::{Result, ToknError};
use crate::registry::{RotationType, Token};
use crate::utils::parse_location_spec;

pub async fn handle_track(
    backend: &dyn MetadataBackend,
    name: &str,
    service: &str,
    rotation_type: &str,
    locations: &[String],
    expiry_days: i64,
    notes: &str,
) -> Result<()> {
    if expiry_days <= 0 {
        return Err(ToknError::validation(format!(
            "Invalid expiry: {} days. Expiry must be at least 1 day from now",
            expiry_days
        )));
    }

    let rotation_type = match rotation_type {
        "auto" => RotationType::Auto,
        "manual" => RotationType::Manual,
        other => {
            return Err(ToknError::validation(format!(
                "Invalid rotation type: {}. Expected auto or manual",
                other
            )));
        }
    };

    let locations = locations
        .iter()
        .map(|s| parse_location_spec(s))
        .collect::<Result<Vec<_>>>()?;

    let mut registry = backend.load().await?;
    if registry.contains(name) {
        return Err(ToknError::validation(format!(
            "Token already tracked: {}",
            name
        )));
    }

    let location_count = locations.len();
    let token = Token {
        service: service.to_string(),
        rotation_type,
        locations,
        expires_at: Utc::now() + Duration::days(expiry_days),
        last_rotated_at: None,
        notes: notes.to_string(),
        extra: Default::default(),
    };

    registry.insert(name, token);
    backend.save(&registry).await?;

    println!(
        "Tracking '{}' ({}, {} rotation, {} location{})",
        name,
        service,
        rotation_type,
        location_count,
        if location_count == 1 { "" } else { "s" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;

    #[tokio::test]
    async fn non_positive_expiry_is_rejected_before_saving() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf());

        for days in [0, -7] {
            let err = handle_track(
                &backend,
                "gh-pat",
                "github",
                "manual",
                &["doppler:GITHUB_TOKEN".to_string()],
                days,
                "",
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ToknError::Validation(_)));
            assert!(err.to_string().contains("at least 1 day"));
        }

        assert!(backend.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf());

        handle_track(
            &backend,
            "gh-pat",
            "github",
            "manual",
            &["doppler:GITHUB_TOKEN".to_string()],
            30,
            "",
        )
        .await
        .unwrap();

        let err = handle_track(
            &backend,
            "gh-pat",
            "github",
            "manual",
            &["doppler:GITHUB_TOKEN".to_string()],
            30,
            "",
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("already tracked"));
    }
}
