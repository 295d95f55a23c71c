//! Remove command handler - stop tracking a token.

use crate::backend::MetadataBackend;
use crate::error::{Result, ToknError};

pub async fn handle_remove(backend: &dyn MetadataBackend, name: &str) -> Result<()> {
    let mut registry = backend.load().await?;
    if !registry.remove(name) {
        return Err(ToknError::not_found(format!("Token not found: {}", name)));
    }
    backend.save(&registry).await?;
    println!("Removed '{}'", name);
    Ok(())
}
