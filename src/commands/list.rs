//! List command handler - tabular overview of tracked tokens.

use chrono_humanize::HumanTime;

use crate::backend::MetadataBackend;
use crate::error::Result;
use crate::registry::TokenStatus;

pub async fn handle_list(backend: &dyn MetadataBackend, expiring: bool) -> Result<()> {
    let registry = backend.load().await?;

    if registry.is_empty() {
        eprintln!("No tokens tracked. Run 'tokn track' to add one.");
        return Ok(());
    }

    let rows: Vec<_> = registry
        .iter()
        .filter(|(_, token)| !expiring || token.status() != TokenStatus::Active)
        .collect();

    if rows.is_empty() {
        eprintln!("No tokens expiring within the warning window.");
        return Ok(());
    }

    let name_width = rows.iter().map(|(n, _)| n.len()).max().unwrap_or(4).max(4);
    let service_width = rows
        .iter()
        .map(|(_, t)| t.service.len())
        .max()
        .unwrap_or(7)
        .max(7);

    println!(
        "{:<name_width$}  {:<service_width$}  {:<6}  {:<13}  {:<12}  LAST ROTATED",
        "NAME", "SERVICE", "TYPE", "STATUS", "EXPIRES"
    );
    for (name, token) in rows {
        let expires = match token.days_until_expiry() {
            d if d < 0 => format!("{}d ago", -d),
            0 => "today".to_string(),
            d => format!("in {}d", d),
        };
        let last_rotated = token
            .last_rotated_at
            .map(|t| HumanTime::from(t).to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<name_width$}  {:<service_width$}  {:<6}  {:<13}  {:<12}  {}",
            name,
            token.service,
            token.rotation_type.to_string(),
            token.status().to_string(),
            expires,
            last_rotated
        );
    }

    Ok(())
}
