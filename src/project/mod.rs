//! Xcode project model.
//!
//! The index builder only needs to open a project, walk its targets, and ask
//! each target for a resolved build setting. Those capabilities are traits so
//! the native `project.pbxproj` reader can be swapped for a fake in tests.
pub mod pbxproj;
pub mod plist;
pub mod settings;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub use pbxproj::{PbxProject, PbxTarget, PbxprojReader};

/// Directory suffix of an Xcode project bundle.
pub const PROJECT_SUFFIX: &str = ".xcodeproj";
/// Directory suffix of an Xcode workspace bundle.
pub const WORKSPACE_SUFFIX: &str = ".xcworkspace";

/// Opens a project bundle on disk.
pub trait ProjectReader {
    type Project: ProjectHandle;

    fn open(&self, path: &Path) -> Result<Self::Project>;
}

/// An opened project.
pub trait ProjectHandle {
    type Target<'a>: TargetHandle
    where
        Self: 'a;

    /// Targets in the order the project declares them.
    fn targets(&self) -> Vec<Self::Target<'_>>;
}

/// A build target within an opened project.
pub trait TargetHandle {
    fn name(&self) -> &str;

    /// Value of `key` shared by every build configuration of the target.
    ///
    /// Returns `Ok(None)` when no configuration sets the key and an error
    /// when configurations disagree.
    fn resolved_build_setting(&self, key: &str) -> Result<Option<String>>;
}

/// First `*.xcodeproj` entry directly under `folder`, by name.
pub fn find_project_file(folder: &Path) -> Result<Option<PathBuf>> {
    if !folder.is_dir() {
        return Ok(None);
    }
    let mut candidates = Vec::new();
    for entry in fs::read_dir(folder).with_context(|| format!("read {}", folder.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(PROJECT_SUFFIX) {
            candidates.push(entry.path());
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_project_by_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("Zeta.xcodeproj")).expect("mkdir");
        fs::create_dir(dir.path().join("Alpha.xcodeproj")).expect("mkdir");
        fs::write(dir.path().join("README.md"), "x").expect("write");

        let found = find_project_file(dir.path()).expect("scan");
        assert_eq!(found, Some(dir.path().join("Alpha.xcodeproj")));
    }

    #[test]
    fn missing_project_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("App.xcworkspace")).expect("mkdir");
        assert_eq!(find_project_file(dir.path()).expect("scan"), None);
    }

    #[test]
    fn missing_folder_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gone = dir.path().join("gone");
        assert_eq!(find_project_file(&gone).expect("scan"), None);
    }
}
