//! Location handlers - reading, writing, snapshotting, and restoring a
//! credential at one storage target.
//!
//! A snapshot is the opaque raw content that was actually present before
//! mutation (the entire file, the entire remote structured value), not just
//! the old token value. Restoring a snapshot is therefore an exact, lossless
//! undo of whatever `write` performed, including untouched sibling data in
//! multi-value targets.

mod doppler;
mod edgerc;
mod flat_file;
mod postman_env;

pub use doppler::DopplerLocationHandler;
pub(crate) use edgerc::parse_section as parse_edgerc_section;
pub use edgerc::EdgercHandler;
pub use flat_file::{GitCredentialsHandler, LinodeCliHandler};
pub use postman_env::PostmanEnvHandler;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Result;
use crate::registry::LocationSpec;

/// Opaque pre-mutation content of one location. Held in memory only, scoped
/// to a single rotation attempt, and zeroed when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Snapshot(String);

impl Snapshot {
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    pub fn content(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Snapshot content is credential material; never print it.
        write!(f, "Snapshot([{} bytes])", self.0.len())
    }
}

/// Uniform capability over every storage target a token value lives in.
#[async_trait]
pub trait LocationHandler: Send + Sync {
    /// Read the current credential value at this location.
    async fn read(&self, spec: &LocationSpec) -> Result<String>;

    /// Write a new credential value, touching only the addressed sub-value
    /// in multi-value targets. File-backed targets end up owner-only 0o600
    /// regardless of their prior permission bits.
    async fn write(&self, spec: &LocationSpec, value: &str) -> Result<()>;

    /// Snapshot the entire current content for a later lossless restore.
    async fn backup(&self, spec: &LocationSpec) -> Result<Snapshot>;

    /// Restore the exact pre-mutation content captured by `backup`.
    async fn restore(&self, spec: &LocationSpec, snapshot: &Snapshot) -> Result<()>;
}

/// The built-in location handler table, keyed by descriptor type tag.
///
/// A static table keeps the capability set auditable; there is no dynamic
/// discovery.
pub fn default_table() -> HashMap<String, Box<dyn LocationHandler>> {
    let mut table: HashMap<String, Box<dyn LocationHandler>> = HashMap::new();
    table.insert("doppler".to_string(), Box::new(DopplerLocationHandler::new()));
    table.insert(
        "git-credentials".to_string(),
        Box::new(GitCredentialsHandler::new()),
    );
    table.insert("linode-cli".to_string(), Box::new(LinodeCliHandler::new()));
    table.insert("edgerc".to_string(), Box::new(EdgercHandler::new()));
    table.insert("postman-env".to_string(), Box::new(PostmanEnvHandler::new()));
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_debug_never_shows_content() {
        let snap = Snapshot::new("super-secret-value");
        let debug = format!("{:?}", snap);
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("18 bytes"));
    }

    #[test]
    fn table_covers_all_builtin_kinds() {
        let table = default_table();
        for kind in ["doppler", "git-credentials", "linode-cli", "edgerc", "postman-env"] {
            assert!(table.contains_key(kind), "missing handler for {}", kind);
        }
    }
}
