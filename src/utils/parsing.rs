//! Parsing for location descriptors.

use crate::error::{Result, ToknError};
use crate::registry::LocationSpec;

/// Parse a location descriptor like "doppler:GITHUB_TOKEN" or
/// "edgerc:~/.edgerc:section=default".
///
/// The format is `type:path[:key=value[,key=value...]]`. Trailing key=value
/// pairs populate the descriptor metadata.
///
/// # Examples
/// ```
/// use tokn::utils::parse_location_spec;
///
/// let spec = parse_location_spec("edgerc:~/.edgerc:section=papi").unwrap();
/// assert_eq!(spec.kind, "edgerc");
/// assert_eq!(spec.path, "~/.edgerc");
/// assert_eq!(spec.meta("section"), Some("papi"));
/// ```
pub fn parse_location_spec(input: &str) -> Result<LocationSpec> {
    let mut parts = input.splitn(3, ':');
    let kind = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();

    if kind.is_empty() || path.is_empty() {
        return Err(ToknError::validation(format!(
            "Invalid location '{}'. Use format: type:path[:key=value,...] \
             (e.g., doppler:GITHUB_TOKEN or edgerc:~/.edgerc:section=default)",
            input
        )));
    }

    let mut spec = LocationSpec::new(kind, path);

    if let Some(meta) = parts.next() {
        for pair in meta.split(',') {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(ToknError::validation(format!(
                    "Invalid metadata pair '{}' in location '{}'. Use key=value",
                    pair, input
                )));
            };
            spec.metadata
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    Ok(spec)
}
