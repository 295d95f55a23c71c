//! Rotate command handler - drives the orchestrator.

use crate::backend::MetadataBackend;
use crate::error::{Result, ToknError};
use crate::rotation::{RotationOrchestrator, RotationOutcome, RotationPlan};

/// Rotate one token or every tracked token. Returns true when any token
/// failed or only partially succeeded, for the process exit code.
pub async fn handle_rotate(
    backend: Box<dyn MetadataBackend>,
    name: Option<&str>,
    all: bool,
    dry_run: bool,
) -> Result<bool> {
    let mut orchestrator = RotationOrchestrator::new(backend).await?;

    if dry_run {
        let names: Vec<String> = if all {
            orchestrator.registry().names().cloned().collect()
        } else {
            let Some(name) = name else {
                return Err(ToknError::validation("Pass a token name or --all"));
            };
            vec![name.to_string()]
        };
        if names.is_empty() {
            eprintln!("No tokens tracked.");
            return Ok(false);
        }

        let mut any_invalid = false;
        for name in &names {
            match orchestrator.plan_token(name) {
                RotationPlan::Auto { service, locations } => {
                    println!(
                        "{}: would rotate via {} and propagate to {}",
                        name,
                        service,
                        locations.join(", ")
                    );
                }
                RotationPlan::Manual { .. } => {
                    println!("{}: manual rotation, nothing to do automatically", name);
                }
                RotationPlan::Invalid { error } => {
                    any_invalid = true;
                    eprintln!("{}: would fail validation: {}", name, error);
                }
            }
        }
        return Ok(any_invalid);
    }

    if all {
        let total = orchestrator.registry().len();
        if total == 0 {
            eprintln!("No tokens tracked.");
            return Ok(false);
        }
        eprintln!("Rotating {} tokens...", total);

        let report = orchestrator.rotate_all().await;
        for (name, locations) in &report.committed {
            eprintln!("  {}: committed ({} locations)", name, locations.len());
        }
        for (name, instructions) in &report.manual {
            eprintln!("  {}: manual rotation required", name);
            println!("{}:\n{}\n", name, instructions);
        }
        for (name, error) in &report.partial {
            eprintln!(
                "  {}: locations rotated but registry save failed: {}",
                name, error
            );
        }
        for (name, error) in &report.failed {
            eprintln!("  {}: failed: {}", name, error);
        }
        eprintln!(
            "Done: {} committed, {} manual, {} failed, {} partial",
            report.committed.len(),
            report.manual.len(),
            report.failed.len(),
            report.partial.len()
        );
        return Ok(report.any_failed());
    }

    let Some(name) = name else {
        return Err(ToknError::validation("Pass a token name or --all"));
    };

    eprintln!("Rotating '{}'...", name);
    match orchestrator.rotate_token(name).await {
        RotationOutcome::Committed {
            locations,
            expires_at,
        } => {
            eprintln!(
                "Rotated '{}': {} location{} updated, expires {}",
                name,
                locations.len(),
                if locations.len() == 1 { "" } else { "s" },
                expires_at.format("%Y-%m-%d")
            );
            Ok(false)
        }
        RotationOutcome::Manual { instructions } => {
            eprintln!("'{}' requires manual rotation:", name);
            println!("{}", instructions);
            Ok(false)
        }
        RotationOutcome::Failed { error, rolled_back } => {
            if rolled_back {
                eprintln!("Rotation of '{}' failed; locations restored: {}", name, error);
            } else {
                eprintln!("Rotation of '{}' failed; nothing changed: {}", name, error);
            }
            Ok(true)
        }
        RotationOutcome::PartialSuccess {
            locations,
            save_error,
        } => {
            eprintln!(
                "Warning: '{}' rotated across {} location{} but the registry save failed: {}",
                name,
                locations.len(),
                if locations.len() == 1 { "" } else { "s" },
                save_error
            );
            eprintln!("The locations hold the new value; re-run 'tokn sync' after fixing the backend.");
            Ok(true)
        }
    }
}
