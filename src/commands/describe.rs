//! Describe command handler - full detail for one token.

use chrono_humanize::HumanTime;

use crate::backend::MetadataBackend;
use crate::error::{Result, ToknError};

pub async fn handle_describe(backend: &dyn MetadataBackend, name: &str) -> Result<()> {
    let registry = backend.load().await?;
    let Some(token) = registry.get(name) else {
        return Err(ToknError::not_found(format!("Token not found: {}", name)));
    };

    println!("Name:          {}", name);
    println!("Service:       {}", token.service);
    println!("Rotation:      {}", token.rotation_type);
    println!("Status:        {}", token.status());
    println!(
        "Expires:       {} ({})",
        token.expires_at.format("%Y-%m-%d"),
        HumanTime::from(token.expires_at)
    );
    match token.last_rotated_at {
        Some(t) => println!("Last rotated:  {}", HumanTime::from(t)),
        None => println!("Last rotated:  never"),
    }
    println!("Locations:");
    for spec in &token.locations {
        if spec.metadata.is_empty() {
            println!("  - {}", spec);
        } else {
            let meta: Vec<String> = spec
                .metadata
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            println!("  - {} ({})", spec, meta.join(", "));
        }
    }
    if !token.notes.is_empty() {
        println!("Notes:         {}", token.notes);
    }
    if !token.extra.is_empty() {
        println!("Extra:");
        for (k, v) in &token.extra {
            println!("  {} = {}", k, v);
        }
    }

    Ok(())
}
