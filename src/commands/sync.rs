//! Sync command handler - reload the registry from the backend.

use crate::backend::MetadataBackend;
use crate::error::Result;

pub async fn handle_sync(backend: &dyn MetadataBackend) -> Result<()> {
    let registry = backend.load().await?;
    println!(
        "Synced {} token{} from the {} backend",
        registry.len(),
        if registry.len() == 1 { "" } else { "s" },
        backend.backend_type()
    );
    Ok(())
}
