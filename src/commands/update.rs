//! Update command handler - explicit metadata edits.

use chrono::{Duration, Utc};

use crate::backend::MetadataBackend;
use crate::error::{Result, ToknError};
use crate::utils::parse_location_spec;

pub async fn handle_update(
    backend: &dyn MetadataBackend,
    name: &str,
    expiry_days: Option<i64>,
    notes: Option<&str>,
    locations: &[String],
) -> Result<()> {
    if expiry_days.is_none() && notes.is_none() && locations.is_empty() {
        return Err(ToknError::validation(
            "Nothing to update: pass --expiry-days, --notes, or --location",
        ));
    }
    if let Some(days) = expiry_days
        && days <= 0
    {
        return Err(ToknError::validation(format!(
            "Invalid expiry: {} days. Expiry must be at least 1 day from now",
            days
        )));
    }

    let parsed = locations
        .iter()
        .map(|s| parse_location_spec(s))
        .collect::<Result<Vec<_>>>()?;

    let mut registry = backend.load().await?;
    let Some(token) = registry.get(name).cloned() else {
        return Err(ToknError::not_found(format!("Token not found: {}", name)));
    };

    let mut token = token;
    if let Some(days) = expiry_days {
        token.expires_at = Utc::now() + Duration::days(days);
    }
    if let Some(notes) = notes {
        token.notes = notes.to_string();
    }
    if !parsed.is_empty() {
        token.locations = parsed;
    }

    registry.insert(name, token);
    backend.save(&registry).await?;

    println!("Updated '{}'", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use crate::registry::{Registry, RotationType, Token};
    use chrono::Duration;

    async fn seeded_backend(dir: &std::path::Path) -> LocalBackend {
        let backend = LocalBackend::new(dir.to_path_buf());
        let mut registry = Registry::new();
        registry.insert(
            "gh-pat",
            Token {
                service: "github".to_string(),
                rotation_type: RotationType::Manual,
                locations: vec![crate::registry::LocationSpec::new("doppler", "GITHUB_TOKEN")],
                expires_at: Utc::now() + Duration::days(30),
                last_rotated_at: None,
                notes: String::new(),
                extra: Default::default(),
            },
        );
        backend.save(&registry).await.unwrap();
        backend
    }

    #[tokio::test]
    async fn non_positive_expiry_is_rejected_without_changes() {
        let dir = tempfile::tempdir().unwrap();
        let backend = seeded_backend(dir.path()).await;
        let before = backend.load().await.unwrap();

        for days in [0, -1] {
            let err = handle_update(&backend, "gh-pat", Some(days), None, &[])
                .await
                .unwrap_err();
            assert!(matches!(err, ToknError::Validation(_)));
        }

        assert_eq!(backend.load().await.unwrap(), before);
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = seeded_backend(dir.path()).await;

        let err = handle_update(&backend, "gh-pat", None, None, &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Nothing to update"));
    }
}
