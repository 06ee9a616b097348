//! Helpers behind the `trading-tools` binary.

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

use trading_cache::{AttributeMap, DurableCache, PathTemplate};

/// On-disk format of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EntryFormat {
    #[default]
    Json,
    Bin,
}

/// Which file inside the resolved directory an operation refers to.
#[derive(Debug, Clone)]
pub enum EntryName {
    /// Default `<operation>.<extension>` naming.
    Operation { name: String, format: EntryFormat },
    /// Explicit filename override.
    File(String),
}

/// Parse a `key=value` attribute argument.
pub fn parse_attr(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got `{}`", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("attribute name cannot be empty in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

pub fn attributes_from_pairs(pairs: &[(String, String)]) -> AttributeMap {
    pairs.iter().cloned().collect()
}

/// Anchor a relative template under `cache_dir`, escaping any braces in it.
pub fn anchor_template(template: &str, cache_dir: &Path) -> String {
    if Path::new(template).is_absolute() {
        return template.to_string();
    }
    let base = cache_dir
        .to_string_lossy()
        .replace('{', "{{")
        .replace('}', "}}");
    format!("{}/{}", base.trim_end_matches('/'), template)
}

pub fn resolve_dir(template: &str, attrs: &AttributeMap) -> Result<PathBuf> {
    let template = PathTemplate::parse(template)?;
    Ok(template.resolve(attrs)?)
}

pub fn entry_path(template: &str, attrs: &AttributeMap, entry: &EntryName) -> Result<PathBuf> {
    let path = match entry {
        EntryName::Operation { name, format } => match format {
            EntryFormat::Json => DurableCache::json(template)?.entry_path(name, attrs)?,
            EntryFormat::Bin => DurableCache::bincode(template)?.entry_path(name, attrs)?,
        },
        EntryName::File(file) => DurableCache::json(template)?
            .with_filename(file.clone())
            .entry_path("", attrs)?,
    };
    Ok(path)
}

/// Delete the entry; returns its path and whether it existed.
pub fn evict(template: &str, attrs: &AttributeMap, entry: &EntryName) -> Result<(PathBuf, bool)> {
    let path = entry_path(template, attrs, entry)?;
    let existed = trading_cache::paths::remove_if_exists(&path)?;
    Ok((path, existed))
}

/// Decode a JSON cache entry and return its `value`.
pub fn inspect(file: &Path) -> Result<serde_json::Value> {
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let value = trading_cache::Codec::decode(&trading_cache::JsonCodec::new(), &bytes)
        .map_err(|e| anyhow!("{} is not a JSON cache entry: {}", file.display(), e))?;
    Ok(value)
}
