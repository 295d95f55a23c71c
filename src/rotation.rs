//! The rotation orchestrator.
//!
//! Runs a single token's rotation as an atomic unit over heterogeneous,
//! individually fallible operations:
//!
//! ```text
//! VALIDATE -> BACKUP -> ROTATE -> PROPAGATE -> PERSIST -> committed
//! ```
//!
//! Failures before PROPAGATE abort with no side effects. A failure during
//! PROPAGATE restores every already-written location from its pre-rotation
//! snapshot, in reverse write order. A failure during PERSIST is reported as
//! partial success: the locations hold the new live value and reverting them
//! would desynchronize live systems, so only the registry record is stale.
//!
//! Batches run strictly sequentially; one token's failure never aborts or
//! rolls back another's. The registry is persisted after every committed
//! token to keep the crash-loss window minimal.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::backend::MetadataBackend;
use crate::error::{Result, ToknError};
use crate::locations::{self, LocationHandler, Snapshot};
use crate::providers::{self, AutoRotation, Provider};
use crate::registry::{LocationSpec, Registry, RotationType, Token};
use crate::utils::scrub_secrets;

/// Expiry horizon applied when a provider reports none, measured from the
/// commit instant.
pub const DEFAULT_EXPIRY_DAYS: i64 = 90;

/// Terminal state of one token's rotation attempt.
#[derive(Debug)]
pub enum RotationOutcome {
    /// Every location holds the new value and the registry is saved.
    Committed {
        locations: Vec<String>,
        expires_at: DateTime<Utc>,
    },
    /// The token is manual-only; nothing was touched.
    Manual { instructions: String },
    /// The rotation aborted. `rolled_back` reports whether location writes
    /// had to be (and were) undone.
    Failed { error: ToknError, rolled_back: bool },
    /// Locations hold the new value but the registry save failed; the
    /// metadata record is stale and needs attention.
    PartialSuccess {
        locations: Vec<String>,
        save_error: ToknError,
    },
}

/// What rotating a token would do, reported by a dry run. Produced by the
/// validation stage alone, so emitting a plan mutates nothing.
#[derive(Debug)]
pub enum RotationPlan {
    /// The token validates; a real run would rotate and propagate to these
    /// locations in order.
    Auto {
        service: String,
        locations: Vec<String>,
    },
    /// The token is manual-only; a real run would print these instructions.
    Manual { instructions: String },
    /// The token would fail validation before any side effect.
    Invalid { error: ToknError },
}

/// Aggregated outcomes of a batch rotation.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub committed: Vec<(String, Vec<String>)>,
    pub manual: Vec<(String, String)>,
    pub failed: Vec<(String, ToknError)>,
    pub partial: Vec<(String, ToknError)>,
}

impl BatchReport {
    /// True when the process exit code should be non-zero.
    pub fn any_failed(&self) -> bool {
        !self.failed.is_empty() || !self.partial.is_empty()
    }
}

/// Pre-rotation snapshots for one rotation attempt, keyed by full location
/// identity. Scoped to the attempt: dropping it (on any exit path) zeroes
/// every snapshot, which is the only guarantee against credential leakage
/// via residual backup data.
struct BackupSet {
    entries: Vec<(LocationSpec, Snapshot)>,
}

impl BackupSet {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn insert(&mut self, spec: LocationSpec, snapshot: Snapshot) {
        self.entries.push((spec, snapshot));
    }

    fn get(&self, spec: &LocationSpec) -> Option<&Snapshot> {
        self.entries.iter().find(|(s, _)| s == spec).map(|(_, snap)| snap)
    }
}

/// Result of the validation stage, shared by real runs and dry runs.
enum Validated<'a> {
    Auto(&'a dyn AutoRotation),
    Manual(String),
}

pub struct RotationOrchestrator {
    backend: Box<dyn MetadataBackend>,
    registry: Registry,
    providers: HashMap<String, Provider>,
    handlers: HashMap<String, Box<dyn LocationHandler>>,
}

impl RotationOrchestrator {
    /// Build an orchestrator over the built-in provider and location tables,
    /// loading the working registry copy through the backend.
    pub async fn new(backend: Box<dyn MetadataBackend>) -> Result<Self> {
        Self::with_components(backend, providers::default_table(), locations::default_table()).await
    }

    /// Build with explicit provider/handler tables. Tests inject scripted
    /// implementations here.
    pub async fn with_components(
        backend: Box<dyn MetadataBackend>,
        providers: HashMap<String, Provider>,
        handlers: HashMap<String, Box<dyn LocationHandler>>,
    ) -> Result<Self> {
        let registry = backend.load().await?;
        Ok(Self {
            backend,
            registry,
            providers,
            handlers,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run the validation stage alone: resolve the provider, check the
    /// capability, check the location types. Mutates nothing.
    fn validate(&self, name: &str, token: &Token) -> Result<Validated<'_>> {
        let Some(provider) = self.providers.get(&token.service) else {
            return Err(ToknError::validation(format!(
                "Unknown service: {}. Known services: {}",
                token.service,
                providers::known_services().join(", ")
            )));
        };

        let auto = match (token.rotation_type, provider) {
            (RotationType::Manual, Provider::Manual(manual)) => {
                return Ok(Validated::Manual(manual.instructions().to_string()));
            }
            (RotationType::Manual, Provider::Auto(auto)) => {
                return Ok(Validated::Manual(format!(
                    "Token is tracked as manual. Rotate it via the {} console, \
                     then run: tokn update {} --expiry-days <days>",
                    auto.service(),
                    name
                )));
            }
            (RotationType::Auto, Provider::Manual(manual)) => {
                return Err(ToknError::capability(
                    manual.service(),
                    "auto rotation requested but this service only supports manual rotation",
                ));
            }
            (RotationType::Auto, Provider::Auto(auto)) => auto,
        };

        if token.locations.is_empty() {
            return Err(ToknError::validation(format!(
                "Token '{}' has no locations",
                name
            )));
        }
        for spec in &token.locations {
            if !self.handlers.contains_key(&spec.kind) {
                return Err(ToknError::validation(format!(
                    "Unknown location type: {}",
                    spec.kind
                )));
            }
        }

        Ok(Validated::Auto(auto.as_ref()))
    }

    /// Report what rotating a token would do, without doing any of it. Runs
    /// only the validation stage; no location or backend is touched.
    pub fn plan_token(&self, name: &str) -> RotationPlan {
        let Some(token) = self.registry.get(name) else {
            return RotationPlan::Invalid {
                error: ToknError::not_found(format!("Token not found: {}", name)),
            };
        };

        match self.validate(name, token) {
            Ok(Validated::Auto(_)) => RotationPlan::Auto {
                service: token.service.clone(),
                locations: token.locations.iter().map(|l| l.to_string()).collect(),
            },
            Ok(Validated::Manual(instructions)) => RotationPlan::Manual { instructions },
            Err(error) => RotationPlan::Invalid { error },
        }
    }

    /// Rotate one token to a terminal state.
    pub async fn rotate_token(&mut self, name: &str) -> RotationOutcome {
        let Some(token) = self.registry.get(name).cloned() else {
            return RotationOutcome::Failed {
                error: ToknError::not_found(format!("Token not found: {}", name)),
                rolled_back: false,
            };
        };

        // VALIDATE: no side effects on any failure path here.
        let auto = match self.validate(name, &token) {
            Ok(Validated::Auto(auto)) => auto,
            Ok(Validated::Manual(instructions)) => {
                return RotationOutcome::Manual { instructions };
            }
            Err(error) => {
                return RotationOutcome::Failed {
                    error,
                    rolled_back: false,
                };
            }
        };

        // BACKUP: snapshot every location before anything is mutated. A
        // failed backup aborts with nothing to restore.
        let mut backups = BackupSet::new();
        for spec in &token.locations {
            let handler = &self.handlers[&spec.kind];
            match handler.backup(spec).await {
                Ok(snapshot) => backups.insert(spec.clone(), snapshot),
                Err(error) => {
                    return RotationOutcome::Failed {
                        error,
                        rolled_back: false,
                    };
                }
            }
        }

        // ROTATE: the first declared location is the source of truth for
        // the current value the provider authenticates with.
        let first = &token.locations[0];
        let current = match self.handlers[&first.kind].read(first).await {
            Ok(value) => value,
            Err(error) => {
                return RotationOutcome::Failed {
                    error,
                    rolled_back: false,
                };
            }
        };

        let result = match auto.rotate(&current, &token).await {
            Ok(result) => result,
            Err(error) => {
                // Nothing has been mutated; the backups die with this scope.
                return RotationOutcome::Failed {
                    error: scrub_error(error, &[current.as_str()]),
                    rolled_back: false,
                };
            }
        };

        // PROPAGATE: write everywhere in declared order; on failure restore
        // what was already written, in reverse write order.
        let mut written: Vec<&LocationSpec> = Vec::new();
        for spec in &token.locations {
            let handler = &self.handlers[&spec.kind];
            if let Err(error) = handler.write(spec, &result.new_value).await {
                let rolled_back = self.rollback(&written, &backups).await;
                return RotationOutcome::Failed {
                    error: scrub_error(error, &[current.as_str(), result.new_value.as_str()]),
                    rolled_back,
                };
            }
            written.push(spec);
        }

        // PERSIST: update metadata and save through the backend. The
        // locations are already live on the new value, so a save failure is
        // partial success, never a rollback.
        let now = Utc::now();
        let location_names: Vec<String> = token.locations.iter().map(|l| l.to_string()).collect();
        let expires_at = result
            .new_expiry
            .unwrap_or_else(|| now + Duration::days(DEFAULT_EXPIRY_DAYS));

        let mut updated = token;
        updated.last_rotated_at = Some(now);
        updated.expires_at = expires_at;
        updated.extra.extend(result.extra.clone());
        self.registry.insert(name, updated);

        match self.backend.save(&self.registry).await {
            Ok(()) => RotationOutcome::Committed {
                locations: location_names,
                expires_at,
            },
            Err(error) => RotationOutcome::PartialSuccess {
                locations: location_names,
                save_error: scrub_error(error, &[current.as_str(), result.new_value.as_str()]),
            },
        }
    }

    /// Rotate every tracked token, each to a terminal state before the next
    /// starts. Failures are isolated per token.
    pub async fn rotate_all(&mut self) -> BatchReport {
        let names: Vec<String> = self.registry.names().cloned().collect();
        let mut report = BatchReport::default();

        for name in names {
            match self.rotate_token(&name).await {
                RotationOutcome::Committed { locations, .. } => {
                    report.committed.push((name, locations));
                }
                RotationOutcome::Manual { instructions } => {
                    report.manual.push((name, instructions));
                }
                RotationOutcome::Failed { error, .. } => {
                    report.failed.push((name, error));
                }
                RotationOutcome::PartialSuccess { save_error, .. } => {
                    report.partial.push((name, save_error));
                }
            }
        }

        report
    }

    /// Restore already-written locations from their snapshots, newest write
    /// first. Returns true when every restore succeeded.
    async fn rollback(&self, written: &[&LocationSpec], backups: &BackupSet) -> bool {
        let mut complete = true;
        for spec in written.iter().rev() {
            let handler = &self.handlers[&spec.kind];
            let Some(snapshot) = backups.get(spec) else {
                complete = false;
                continue;
            };
            if let Err(e) = handler.restore(spec, snapshot).await {
                eprintln!("warning: failed to restore {}: {}", spec, e);
                complete = false;
            }
        }
        complete
    }
}

/// Rebuild an error with every occurrence of the given credential values
/// redacted from its message.
fn scrub_error(error: ToknError, secrets: &[&str]) -> ToknError {
    match error {
        ToknError::Provider {
            service,
            kind,
            message,
        } => ToknError::Provider {
            service,
            kind,
            message: scrub_secrets(&message, secrets),
        },
        ToknError::Location {
            location,
            kind,
            message,
        } => ToknError::Location {
            location,
            kind,
            message: scrub_secrets(&message, secrets),
        },
        ToknError::Backend { backend, message } => ToknError::Backend {
            backend,
            message: scrub_secrets(&message, secrets),
        },
        ToknError::Other(message) => ToknError::Other(scrub_secrets(&message, secrets)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LocationErrorKind, ProviderErrorKind};

    #[test]
    fn scrub_error_redacts_message_fields() {
        let error = ToknError::provider(
            "linode",
            ProviderErrorKind::Api,
            "create failed echoing sk-live-42 back",
        );
        let scrubbed = scrub_error(error, &["sk-live-42"]);
        assert!(!scrubbed.to_string().contains("sk-live-42"));
        assert!(scrubbed.to_string().contains("[redacted]"));
    }

    #[test]
    fn scrub_error_keeps_structure() {
        let error = ToknError::location("doppler:X", LocationErrorKind::WriteFailed, "boom secret");
        match scrub_error(error, &["secret"]) {
            ToknError::Location { kind, message, .. } => {
                assert_eq!(kind, LocationErrorKind::WriteFailed);
                assert_eq!(message, "boom [redacted]");
            }
            _ => panic!("variant changed during scrub"),
        }
    }
}
