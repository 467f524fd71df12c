//! Version selection over `agvtool what-marketing-version -terse` output.
//!
//! Resolution is a pure function of the tool output, the caller's hints, the
//! target index, and the directory the tool ran in. The first qualifying line
//! wins; later lines are never inspected.
use crate::index::TargetPlistIndex;
use crate::util::absolute_path;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Marker that identifies a genuine per-project entry in untargeted output.
pub const PROJECT_MARKER: &str = ".xcodeproj";

/// Optional disambiguation hints supplied by the caller.
///
/// `scheme` is a deprecated alias for `target`. When both are set the target
/// wins because the scheme rule only applies without a target; disagreement
/// between the two is undefined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionHints {
    pub target: Option<String>,
    pub scheme: Option<String>,
}

impl ResolutionHints {
    pub fn new(target: Option<String>, scheme: Option<String>) -> Self {
        Self { target, scheme }
    }

    /// Target name, treating an empty string as absent.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref().filter(|value| !value.is_empty())
    }

    /// Scheme name, treating an empty string as absent.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref().filter(|value| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.target().is_none() && self.scheme().is_none()
    }
}

/// One `path = version` line split on its first `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultLine<'a> {
    /// Path text exactly as printed, quotes and padding included.
    pub raw_path: &'a str,
    /// Everything after the first `=`, trimmed.
    pub version: &'a str,
}

impl<'a> ResultLine<'a> {
    /// Split a line; lines without `=` are not result lines.
    pub fn parse(line: &'a str) -> Option<Self> {
        let (raw_path, version) = line.split_once('=')?;
        Some(Self {
            raw_path,
            version: version.trim(),
        })
    }

    /// Path with every `"` removed and padding trimmed.
    pub fn clean_path(&self) -> String {
        self.raw_path.replace('"', "").trim().to_string()
    }

    /// Absolute form of the path relative to the tool's working directory.
    pub fn absolute_path(&self, base_dir: &Path) -> Option<PathBuf> {
        let clean = self.clean_path();
        if clean.is_empty() {
            return None;
        }
        Some(absolute_path(Path::new(&clean), base_dir))
    }
}

/// Which rule selected a line.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    ProjectMarker,
    TargetDirectory,
    TargetPlistPrefix,
    TargetIndex,
    SchemePrefix,
}

/// Selected line and the rule that selected it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub version: String,
    pub line: usize,
    pub rule: MatchRule,
}

/// Resolve the marketing version, returning `""` when nothing matches.
pub fn resolve<S: AsRef<str>>(
    lines: &[S],
    hints: &ResolutionHints,
    index: &TargetPlistIndex,
    base_dir: &Path,
) -> String {
    resolve_match(lines, hints, index, base_dir)
        .map(|resolution| resolution.version)
        .unwrap_or_default()
}

/// Like [`resolve`], but reports which line and rule produced the value.
pub fn resolve_match<S: AsRef<str>>(
    lines: &[S],
    hints: &ResolutionHints,
    index: &TargetPlistIndex,
    base_dir: &Path,
) -> Option<Resolution> {
    lines.iter().enumerate().find_map(|(line_no, line)| {
        let parsed = ResultLine::parse(line.as_ref())?;
        let rule = if hints.is_empty() {
            match_untargeted(&parsed)
        } else {
            match_targeted(&parsed, hints, index, base_dir)
        }?;
        Some(Resolution {
            version: parsed.version.to_string(),
            line: line_no,
            rule,
        })
    })
}

// Untargeted terse output sometimes leads with a spurious line; the first
// line naming the project file is the real answer.
fn match_untargeted(line: &ResultLine<'_>) -> Option<MatchRule> {
    line.raw_path
        .contains(PROJECT_MARKER)
        .then_some(MatchRule::ProjectMarker)
}

fn match_targeted(
    line: &ResultLine<'_>,
    hints: &ResolutionHints,
    index: &TargetPlistIndex,
    base_dir: &Path,
) -> Option<MatchRule> {
    let plist_path = line.absolute_path(base_dir)?;
    let plist_text = plist_path.to_string_lossy();

    if let Some(target) = hints.target() {
        if plist_text.contains(&format!("/{target}/")) {
            return Some(MatchRule::TargetDirectory);
        }
        if plist_text.contains(&format!("/{target}-")) {
            return Some(MatchRule::TargetPlistPrefix);
        }
        if index.get(target) == Some(&plist_path) {
            return Some(MatchRule::TargetIndex);
        }
        return None;
    }

    let scheme = hints.scheme()?;
    plist_text
        .contains(&format!("/{scheme}"))
        .then_some(MatchRule::SchemePrefix)
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
