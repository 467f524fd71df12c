//! Target name to Info.plist index, used as the last resolution fallback.
use crate::project::{find_project_file, ProjectHandle, ProjectReader, TargetHandle};
use crate::util::absolute_path;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Build setting naming a target's Info.plist.
pub const INFOPLIST_KEY: &str = "INFOPLIST_FILE";

/// Target name to absolute Info.plist path.
pub type TargetPlistIndex = BTreeMap<String, PathBuf>;

/// Index the first project found directly under `project_folder`.
///
/// A folder without a project yields an empty index. Targets without an
/// Info.plist setting, or whose configurations disagree on it, are left out.
pub fn build_index<R: ProjectReader>(project_folder: &Path, reader: &R) -> Result<TargetPlistIndex> {
    let mut index = TargetPlistIndex::new();
    let Some(project_path) = find_project_file(project_folder)? else {
        tracing::debug!(
            folder = %project_folder.display(),
            "unable to find an Xcode project in folder"
        );
        return Ok(index);
    };

    let project = reader
        .open(&project_path)
        .with_context(|| format!("open {}", project_path.display()))?;
    for target in project.targets() {
        let name = target.name();
        let plist = match target.resolved_build_setting(INFOPLIST_KEY) {
            Ok(Some(plist)) => plist,
            Ok(None) => {
                tracing::debug!(target_name = name, "target has no {INFOPLIST_KEY}");
                continue;
            }
            Err(err) => {
                tracing::warn!(target_name = name, error = %err, "skipping target");
                continue;
            }
        };
        let plist_path = absolute_path(Path::new(&plist), project_folder);
        tracing::debug!(target_name = name, plist = %plist_path.display(), "indexed target");
        index.insert(name.to_string(), plist_path);
    }
    Ok(index)
}
