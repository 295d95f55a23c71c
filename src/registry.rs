//! Token metadata model and the persisted registry.
//!
//! The registry stores *metadata only* - names, services, rotation schedules,
//! and the locations where a credential's live value is consumed. No field
//! ever holds a credential value; the values themselves live exclusively in
//! the locations.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a token gets rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationType {
    Auto,
    Manual,
}

impl fmt::Display for RotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationType::Auto => write!(f, "auto"),
            RotationType::Manual => write!(f, "manual"),
        }
    }
}

/// Derived expiry status of a token. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Active,
    ExpiringSoon,
    Expired,
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStatus::Active => write!(f, "active"),
            TokenStatus::ExpiringSoon => write!(f, "expiring soon"),
            TokenStatus::Expired => write!(f, "expired"),
        }
    }
}

/// One place where a token's live value is consumed.
///
/// Identity (for backup tracking during rotation) is the full triple of
/// kind, path, and metadata. The textual form is
/// `type:path[:key=value[,key=value...]]`, parsed by [`crate::utils::parse_location_spec`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationSpec {
    /// Selects the location handler ("doppler", "edgerc", "git-credentials", ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Target identifier: a file path, a secret name, a variable key.
    pub path: String,
    /// Target-specific parameters (section name, project/config pair, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl LocationSpec {
    pub fn new(kind: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            path: path.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Look up a metadata parameter.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

impl fmt::Display for LocationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.path)
    }
}

/// Number of days below which a token counts as expiring soon.
pub const EXPIRY_WARNING_DAYS: i64 = 7;

/// Metadata for one tracked token. The token's name is the registry key,
/// not a field, so the persisted shape is exactly a map from name to this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Provider identifier ("cloudflare", "linode", "akamai", "github", ...).
    pub service: String,
    pub rotation_type: RotationType,
    /// Propagation order. The first location is the source of truth for the
    /// current value during rotation.
    pub locations: Vec<LocationSpec>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rotated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Open key/value bag for provider-specific data (account id, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Token {
    /// Whole days until expiry. Negative once expired.
    pub fn days_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_days()
    }

    pub fn status(&self) -> TokenStatus {
        let days = self.days_until_expiry();
        if days < 0 {
            TokenStatus::Expired
        } else if days <= EXPIRY_WARNING_DAYS {
            TokenStatus::ExpiringSoon
        } else {
            TokenStatus::Active
        }
    }
}

/// The full collection of tracked tokens, keyed by unique name.
///
/// Serializes transparently as a JSON object mapping name to token, which is
/// the blob the metadata backends persist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    tokens: BTreeMap<String, Token>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Token> {
        self.tokens.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tokens.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, token: Token) {
        self.tokens.insert(name.into(), token);
    }

    /// Remove a token. Returns true if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.tokens.remove(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Token)> {
        self.tokens.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.tokens.keys()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_token() -> Token {
        let mut loc = LocationSpec::new("edgerc", "~/.edgerc");
        loc.metadata.insert("section".to_string(), "default".to_string());
        Token {
            service: "akamai".to_string(),
            rotation_type: RotationType::Auto,
            locations: vec![loc, LocationSpec::new("doppler", "AKAMAI_SECRET")],
            expires_at: Utc::now() + Duration::days(90),
            last_rotated_at: None,
            notes: String::new(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn registry_serializes_as_top_level_map() {
        let mut registry = Registry::new();
        registry.insert("edge-creds", sample_token());

        let json: serde_json::Value = serde_json::to_value(&registry).unwrap();
        let entry = &json["edge-creds"];
        assert_eq!(entry["service"], "akamai");
        assert_eq!(entry["rotation_type"], "auto");
        assert_eq!(entry["locations"][0]["type"], "edgerc");
        assert_eq!(entry["locations"][0]["metadata"]["section"], "default");
        // Unset optional fields are omitted from the blob.
        assert!(entry.get("last_rotated_at").is_none());
        assert!(entry.get("notes").is_none());
    }

    #[test]
    fn registry_round_trips() {
        let mut registry = Registry::new();
        registry.insert("edge-creds", sample_token());

        let blob = serde_json::to_string(&registry).unwrap();
        let loaded: Registry = serde_json::from_str(&blob).unwrap();
        assert_eq!(registry, loaded);
    }

    #[test]
    fn status_thresholds() {
        let mut token = sample_token();
        assert_eq!(token.status(), TokenStatus::Active);

        token.expires_at = Utc::now() + Duration::days(3);
        assert_eq!(token.status(), TokenStatus::ExpiringSoon);

        token.expires_at = Utc::now() - Duration::days(1);
        assert_eq!(token.status(), TokenStatus::Expired);
    }

    #[test]
    fn location_identity_includes_metadata() {
        let a = LocationSpec::new("edgerc", "~/.edgerc");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.metadata.insert("section".to_string(), "papi".to_string());
        assert_ne!(a, b);
    }
}
