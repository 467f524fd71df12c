//! Shared pipeline state ("lane context") for downstream build steps.
//!
//! The context is a flat JSON object on disk. Each publish loads it, sets one
//! key, and replaces the file through a temp file + rename so readers never
//! observe a partial write.
use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Key under which the resolved marketing version is published.
pub const VERSION_NUMBER: &str = "VERSION_NUMBER";

/// Load the context object, treating a missing file as empty.
pub fn load_context(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(&bytes).context("parse lane context JSON")? {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow!("lane context {} is not a JSON object", path.display())),
    }
}

/// Set `key` to `value` in the context at `path`, keeping other keys.
pub fn publish(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut context = load_context(path)?;
    context.insert(key.to_string(), Value::String(value.to_string()));
    let text = serde_json::to_string_pretty(&Value::Object(context))
        .context("serialize lane context")?;
    write_atomic(path, text.as_bytes())?;
    tracing::debug!(path = %path.display(), key, value, "published lane value");
    Ok(())
}

fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let file_name = dest
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("lane_context.json");
    let tmp_path = parent.join(format!(".{file_name}.tmp"));
    fs::write(&tmp_path, bytes).with_context(|| format!("write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, dest).with_context(|| format!("publish {}", dest.display()))?;
    Ok(())
}
