//! Command orchestration: locate the project, index its targets, query
//! agvtool, resolve, and publish.
use crate::agvtool::Agvtool;
use crate::cli::{GetArgs, ProjectArgs, TargetsArgs};
use crate::index::{build_index, TargetPlistIndex};
use crate::lane;
use crate::project::{PbxprojReader, WORKSPACE_SUFFIX};
use crate::resolve::{resolve_match, Resolution, ResolutionHints};
use crate::util::{absolute_path, display_path};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};

/// Result of a version lookup.
#[derive(Serialize, Debug, Clone)]
pub struct VersionReport {
    pub version_number: String,
    pub project_folder: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<Resolution>,
}

#[derive(Serialize)]
struct TargetEntry<'a> {
    name: &'a str,
    info_plist: &'a Path,
}

/// Run `xcver get`.
pub fn run_get(args: &GetArgs) -> Result<()> {
    let folder = project_folder(&args.project)?;
    let hints = ResolutionHints::new(args.target.clone(), args.scheme.clone());
    if let Some(scheme) = hints.scheme() {
        tracing::warn!(scheme, "--scheme is deprecated; use --target instead");
        if hints.target().is_some_and(|target| target != scheme) {
            tracing::warn!("--scheme is ignored when --target is set");
        }
    }
    let agvtool = Agvtool::parse(&args.agvtool)?;

    let report = get_version_number(&folder, &hints, &agvtool)?;

    if let Some(path) = &args.lane_context {
        lane::publish(path, lane::VERSION_NUMBER, &report.version_number)?;
    }

    if args.json {
        let text = serde_json::to_string_pretty(&report)?;
        println!("{text}");
    } else {
        println!("{}", report.version_number);
    }
    Ok(())
}

/// Run `xcver targets`.
pub fn run_targets(args: &TargetsArgs) -> Result<()> {
    let folder = project_folder(&args.project)?;
    let index = build_index(&folder, &PbxprojReader)?;
    if args.json {
        let entries: Vec<TargetEntry<'_>> = index
            .iter()
            .map(|(name, plist)| TargetEntry {
                name,
                info_plist: plist,
            })
            .collect();
        let text = serde_json::to_string_pretty(&entries)?;
        println!("{text}");
        return Ok(());
    }
    for (name, plist) in &index {
        println!("{name}\t{}", display_path(plist, Some(&folder)));
    }
    Ok(())
}

/// Resolve the marketing version for the project in `folder`.
///
/// The target index is built before agvtool runs, whether or not the
/// fallback ends up needing it. An empty `version_number` means no line
/// matched; that is reported, not raised.
pub fn get_version_number(
    folder: &Path,
    hints: &ResolutionHints,
    agvtool: &Agvtool,
) -> Result<VersionReport> {
    let index: TargetPlistIndex = build_index(folder, &PbxprojReader)?;
    tracing::debug!(targets = index.len(), "built target index");

    let lines = agvtool.marketing_versions(folder)?;
    let matched = resolve_match(&lines, hints, &index, folder);
    match &matched {
        Some(resolution) => tracing::debug!(
            line = resolution.line,
            rule = ?resolution.rule,
            version = %resolution.version,
            "resolved marketing version"
        ),
        None => tracing::warn!(
            lines = lines.len(),
            "no agvtool output line matched; version number is empty"
        ),
    }

    Ok(VersionReport {
        version_number: matched
            .as_ref()
            .map(|resolution| resolution.version.clone())
            .unwrap_or_default(),
        project_folder: folder.to_path_buf(),
        target: hints.target().map(str::to_string),
        scheme: hints.scheme().map(str::to_string),
        matched,
    })
}

/// Folder containing the project: the parent of `--xcodeproj`, or the
/// current directory.
pub fn project_folder(args: &ProjectArgs) -> Result<PathBuf> {
    let cwd = env::current_dir().context("resolve current directory")?;
    let Some(xcodeproj) = &args.xcodeproj else {
        return Ok(cwd);
    };
    validate_xcodeproj(xcodeproj)?;
    Ok(absolute_path(&xcodeproj.join(".."), &cwd))
}

fn validate_xcodeproj(path: &Path) -> Result<()> {
    let text = path.to_string_lossy();
    if text.trim_end_matches('/').ends_with(WORKSPACE_SUFFIX) {
        return Err(anyhow!(
            "please pass the path to the project, not the workspace: {}",
            path.display()
        ));
    }
    if !path.exists() {
        let shown = env::current_dir()
            .map(|cwd| absolute_path(path, &cwd))
            .unwrap_or_else(|_| path.to_path_buf());
        return Err(anyhow!(
            "could not find Xcode project at path '{}'",
            shown.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn workspace_path_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = dir.path().join("App.xcworkspace");
        fs::create_dir(&workspace).expect("mkdir");
        let err = project_folder(&ProjectArgs {
            xcodeproj: Some(workspace),
        })
        .expect_err("workspace");
        assert!(err.to_string().contains("not the workspace"));
    }

    #[test]
    fn missing_project_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = project_folder(&ProjectArgs {
            xcodeproj: Some(dir.path().join("Gone.xcodeproj")),
        })
        .expect_err("missing");
        assert!(err.to_string().contains("Gone.xcodeproj"));
    }

    #[test]
    fn folder_is_parent_of_project() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = dir.path().join("App.xcodeproj");
        fs::create_dir(&project).expect("mkdir");
        let folder = project_folder(&ProjectArgs {
            xcodeproj: Some(project),
        })
        .expect("folder");
        assert_eq!(folder, dir.path());
    }

    #[test]
    fn folder_defaults_to_current_directory() {
        let folder = project_folder(&ProjectArgs::default()).expect("folder");
        assert_eq!(folder, env::current_dir().expect("cwd"));
    }
}
