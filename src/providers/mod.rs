//! Rotation providers - the service-specific logic that knows how to rotate
//! (or explain how to manually rotate) a credential.
//!
//! Capability is a tagged variant: auto providers carry a [`AutoRotation`]
//! implementation, manual providers carry only instruction text. That a
//! manual provider has no `rotate` to call is a type-level fact, not a
//! runtime flag.

mod akamai;
mod cloudflare;
mod linode;
mod manual;

pub use akamai::AkamaiProvider;
pub use cloudflare::CloudflareProvider;
pub use linode::LinodeProvider;
pub use manual::ManualRotation;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::registry::Token;

/// Outcome of a successful provider rotation. The orchestrator is agnostic
/// to which rotation pattern produced it.
#[derive(Debug, Clone)]
pub struct RotationResult {
    /// The new live credential value. Propagated to every location, never
    /// persisted in the registry.
    pub new_value: String,
    /// Expiry reported by the service. When absent, the orchestrator applies
    /// its standard default horizon.
    pub new_expiry: Option<DateTime<Utc>>,
    /// Provider-specific companion data (e.g. a new Akamai client_token),
    /// merged into the token's extra bag on commit.
    pub extra: BTreeMap<String, String>,
}

impl RotationResult {
    pub fn new(new_value: impl Into<String>) -> Self {
        Self {
            new_value: new_value.into(),
            new_expiry: None,
            extra: BTreeMap::new(),
        }
    }
}

/// A provider that can rotate a credential without human involvement.
#[async_trait]
pub trait AutoRotation: Send + Sync {
    fn service(&self) -> &'static str;

    /// Perform the rotation. `current_value` is the live credential read
    /// from the token's source-of-truth location; providers use it to
    /// authenticate their own rotation call.
    async fn rotate(&self, current_value: &str, token: &Token) -> Result<RotationResult>;
}

/// Capability variant for one service.
pub enum Provider {
    Auto(Box<dyn AutoRotation>),
    Manual(ManualRotation),
}

impl Provider {
    pub fn service(&self) -> &str {
        match self {
            Provider::Auto(p) => p.service(),
            Provider::Manual(m) => m.service(),
        }
    }

    pub fn supports_auto_rotation(&self) -> bool {
        matches!(self, Provider::Auto(_))
    }
}

/// The built-in provider table, keyed by service identifier. A static table
/// keeps the capability set auditable.
pub fn default_table() -> HashMap<String, Provider> {
    let mut table = HashMap::new();
    table.insert(
        "cloudflare".to_string(),
        Provider::Auto(Box::new(CloudflareProvider::new()) as Box<dyn AutoRotation>),
    );
    table.insert(
        "linode".to_string(),
        Provider::Auto(Box::new(LinodeProvider::new()) as Box<dyn AutoRotation>),
    );
    table.insert(
        "akamai".to_string(),
        Provider::Auto(Box::new(AkamaiProvider::new()) as Box<dyn AutoRotation>),
    );
    table.insert("github".to_string(), Provider::Manual(manual::github()));
    table.insert("postman".to_string(), Provider::Manual(manual::postman()));
    table.insert(
        "terraform-account".to_string(),
        Provider::Manual(manual::terraform_account()),
    );
    table.insert("other".to_string(), Provider::Manual(manual::other()));
    table
}

/// Service identifiers accepted by `tokn track --service`.
pub fn known_services() -> Vec<&'static str> {
    vec![
        "cloudflare",
        "linode",
        "akamai",
        "github",
        "postman",
        "terraform-account",
        "other",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_known_services() {
        let table = default_table();
        for service in known_services() {
            assert!(table.contains_key(service), "missing provider for {}", service);
        }
        assert_eq!(table.len(), known_services().len());
    }

    #[test]
    fn capability_split() {
        let table = default_table();
        assert!(table["cloudflare"].supports_auto_rotation());
        assert!(table["linode"].supports_auto_rotation());
        assert!(table["akamai"].supports_auto_rotation());
        assert!(!table["github"].supports_auto_rotation());
        assert!(!table["other"].supports_auto_rotation());
    }
}
