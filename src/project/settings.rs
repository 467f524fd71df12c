//! Build-setting value resolution.
//!
//! Target settings override project settings per build configuration, with
//! `$(inherited)` splicing in the project value. Macro references such as
//! `$(SRCROOT)` or `${TARGET_NAME}` are then expanded against the merged
//! settings and a few built-ins. Unknown references are left as written.
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub type BuildSettings = BTreeMap<String, String>;

/// Bound on nested macro expansion; also stops self-referential settings.
pub const MAX_EXPANSION_DEPTH: usize = 8;

const INHERITED: [&str; 2] = ["$(inherited)", "${inherited}"];

/// `$(NAME)`, `${NAME}`, and either form with a `:modifier` suffix.
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$\(([A-Za-z_][A-Za-z0-9_]*)(?::[^)]*)?\)|\$\{([A-Za-z_][A-Za-z0-9_]*)(?::[^}]*)?\}",
    )
    .expect("regex for build setting references")
});

/// Combine a target-level value with the project-level value it overrides.
pub fn merge_inherited(target: Option<&str>, project: Option<&str>) -> Option<String> {
    let Some(target) = target else {
        return project.map(str::to_string);
    };
    if !INHERITED.iter().any(|token| target.contains(token)) {
        return Some(target.to_string());
    }
    let mut merged = target.to_string();
    for token in INHERITED {
        merged = merged.replace(token, project.unwrap_or_default());
    }
    Some(merged.trim().to_string())
}

/// Settings visible while expanding one build configuration.
pub struct SettingsScope<'a> {
    pub target: &'a BuildSettings,
    pub project: &'a BuildSettings,
    pub builtins: &'a BuildSettings,
}

impl SettingsScope<'_> {
    /// Merged raw value of `key`; built-ins only fill gaps.
    pub fn raw(&self, key: &str) -> Option<String> {
        merge_inherited(
            self.target.get(key).map(String::as_str),
            self.project.get(key).map(String::as_str),
        )
        .or_else(|| self.builtins.get(key).cloned())
    }

    /// Fully expanded value of `key`, or `None` when unset.
    pub fn resolve(&self, key: &str) -> Option<String> {
        let raw = self.raw(key)?;
        Some(self.expand(&raw))
    }

    pub fn expand(&self, value: &str) -> String {
        self.expand_with(&REFERENCE_RE, value, 0)
    }

    fn expand_with(&self, pattern: &Regex, value: &str, depth: usize) -> String {
        if depth >= MAX_EXPANSION_DEPTH || !value.contains('$') {
            return value.to_string();
        }
        pattern
            .replace_all(value, |caps: &Captures<'_>| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                match self.raw(name) {
                    Some(raw) => self.expand_with(pattern, &raw, depth + 1),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}
