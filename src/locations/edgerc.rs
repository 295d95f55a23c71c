//! Akamai .edgerc file handler.
//!
//! The .edgerc file is INI-formatted with one section per API client, each
//! holding client_secret, host, access_token, and client_token. Writes edit
//! the addressed section's client_secret line in place, leaving every other
//! section (and every other line of the addressed section) byte-for-byte
//! unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{LocationHandler, Snapshot};
use crate::config::expand_tilde;
use crate::error::{LocationErrorKind, Result, ToknError};
use crate::registry::LocationSpec;
use crate::utils::restrict_file_permissions;

const DEFAULT_SECTION: &str = "default";

pub struct EdgercHandler;

impl EdgercHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EdgercHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_path(spec: &LocationSpec) -> PathBuf {
    expand_tilde(&spec.path)
}

fn section_of(spec: &LocationSpec) -> &str {
    spec.meta("section").unwrap_or(DEFAULT_SECTION)
}

fn read_file(spec: &LocationSpec, path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ToknError::location(
            spec.to_string(),
            LocationErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        ));
    }
    std::fs::read_to_string(path).map_err(|e| {
        ToknError::location(spec.to_string(), LocationErrorKind::PermissionDenied, e.to_string())
    })
}

/// Extract `key = value` pairs from one section.
pub(crate) fn parse_section(content: &str, section: &str) -> Option<BTreeMap<String, String>> {
    let mut in_section = false;
    let mut found = false;
    let mut values = BTreeMap::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(name) = section_header(trimmed) {
            in_section = name == section;
            found |= in_section;
            continue;
        }
        if in_section
            && !trimmed.starts_with(';')
            && !trimmed.starts_with('#')
            && let Some((key, value)) = trimmed.split_once('=')
        {
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    found.then_some(values)
}

fn section_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('[')?;
    // Akamai allows trailing comments after the bracket: `[default] ; note`
    let name = rest.split(']').next()?;
    Some(name.trim())
}

/// Replace one key's line inside one section, preserving every other line
/// exactly. Returns None when the section or key is absent.
fn replace_key(content: &str, section: &str, key: &str, value: &str) -> Option<String> {
    let mut in_section = false;
    let mut replaced = false;
    let mut out: Vec<String> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(name) = section_header(trimmed) {
            in_section = name == section;
            out.push(line.to_string());
            continue;
        }
        if in_section
            && !replaced
            && let Some((k, _)) = trimmed.split_once('=')
            && k.trim() == key
        {
            out.push(format!("{} = {}", key, value));
            replaced = true;
            continue;
        }
        out.push(line.to_string());
    }

    replaced.then(|| {
        let mut text = out.join("\n");
        if content.ends_with('\n') {
            text.push('\n');
        }
        text
    })
}

#[async_trait]
impl LocationHandler for EdgercHandler {
    async fn read(&self, spec: &LocationSpec) -> Result<String> {
        let path = resolve_path(spec);
        let content = read_file(spec, &path)?;
        let section = section_of(spec);

        parse_section(&content, section)
            .and_then(|values| values.get("client_secret").cloned())
            .ok_or_else(|| {
                ToknError::location(
                    spec.to_string(),
                    LocationErrorKind::NotFound,
                    format!("no client_secret in section [{}]", section),
                )
            })
    }

    async fn write(&self, spec: &LocationSpec, value: &str) -> Result<()> {
        let path = resolve_path(spec);
        let content = read_file(spec, &path)?;
        let section = section_of(spec);

        let updated = replace_key(&content, section, "client_secret", value).ok_or_else(|| {
            ToknError::location(
                spec.to_string(),
                LocationErrorKind::WriteFailed,
                format!("no client_secret line in section [{}]", section),
            )
        })?;

        std::fs::write(&path, updated).map_err(|e| {
            ToknError::location(spec.to_string(), LocationErrorKind::WriteFailed, e.to_string())
        })?;
        restrict_file_permissions(&path).map_err(|e| {
            ToknError::location(spec.to_string(), LocationErrorKind::WriteFailed, e.to_string())
        })
    }

    async fn backup(&self, spec: &LocationSpec) -> Result<Snapshot> {
        let path = resolve_path(spec);
        Ok(Snapshot::new(read_file(spec, &path)?))
    }

    async fn restore(&self, spec: &LocationSpec, snapshot: &Snapshot) -> Result<()> {
        let path = resolve_path(spec);
        std::fs::write(&path, snapshot.content()).map_err(|e| {
            ToknError::location(spec.to_string(), LocationErrorKind::WriteFailed, e.to_string())
        })?;
        restrict_file_permissions(&path).map_err(|e| {
            ToknError::location(spec.to_string(), LocationErrorKind::WriteFailed, e.to_string())
        })
    }
}
