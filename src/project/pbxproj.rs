//! Native reader for `<name>.xcodeproj/project.pbxproj`.
//!
//! The object graph is flattened at open time into the pieces the target
//! index needs: target names in declaration order and the build settings of
//! every build configuration, for the project and for each target.
use super::plist::{self, Dictionary, Value};
use super::settings::{BuildSettings, SettingsScope};
use super::{ProjectHandle, ProjectReader, TargetHandle};
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const PBXPROJ_FILE: &str = "project.pbxproj";
const PROJECT_ISA: &str = "PBXProject";
const TARGET_ISAS: [&str; 3] = ["PBXNativeTarget", "PBXAggregateTarget", "PBXLegacyTarget"];

/// Reads projects from disk with the built-in plist parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct PbxprojReader;

impl ProjectReader for PbxprojReader {
    type Project = PbxProject;

    fn open(&self, path: &Path) -> Result<PbxProject> {
        PbxProject::open(path)
    }
}

/// Named build configuration and its settings.
#[derive(Debug, Clone)]
struct Configuration {
    name: String,
    settings: BuildSettings,
}

#[derive(Debug, Clone)]
struct TargetRecord {
    name: String,
    product_name: Option<String>,
    configurations: Vec<Configuration>,
}

/// An opened Xcode project.
#[derive(Debug, Clone)]
pub struct PbxProject {
    path: PathBuf,
    builtins: BuildSettings,
    configurations: BTreeMap<String, BuildSettings>,
    targets: Vec<TargetRecord>,
}

impl PbxProject {
    /// Open the project bundle at `path` (the `.xcodeproj` directory).
    pub fn open(path: &Path) -> Result<Self> {
        let pbxproj = path.join(PBXPROJ_FILE);
        let text = fs::read_to_string(&pbxproj)
            .with_context(|| format!("read {}", pbxproj.display()))?;
        let root = plist::parse(&text).with_context(|| format!("parse {}", pbxproj.display()))?;
        Self::from_document(path, &root).with_context(|| format!("load {}", pbxproj.display()))
    }

    /// Build the model from an already parsed document.
    pub fn from_document(path: &Path, root: &Value) -> Result<Self> {
        let objects = root
            .get("objects")
            .and_then(Value::as_dictionary)
            .ok_or_else(|| anyhow!("missing objects dictionary"))?;
        let root_id = root
            .get_str("rootObject")
            .ok_or_else(|| anyhow!("missing rootObject"))?;
        let project = lookup(objects, root_id)?;
        if project.get_str("isa") != Some(PROJECT_ISA) {
            return Err(anyhow!("rootObject {root_id} is not a {PROJECT_ISA}"));
        }

        let configurations = configuration_list(objects, project)?
            .into_iter()
            .map(|config| (config.name, config.settings))
            .collect();

        let mut targets = Vec::new();
        for target_id in project.get("targets").and_then(Value::as_array).unwrap_or_default() {
            let target_id = target_id
                .as_str()
                .ok_or_else(|| anyhow!("target reference is not an object id"))?;
            let target = lookup(objects, target_id)?;
            let isa = target.get_str("isa").unwrap_or_default();
            if !TARGET_ISAS.contains(&isa) {
                tracing::debug!(target_id, isa, "skipping non-target object");
                continue;
            }
            let Some(name) = target.get_str("name") else {
                tracing::warn!(target_id, "target has no name; skipping");
                continue;
            };
            targets.push(TargetRecord {
                name: name.to_string(),
                product_name: target.get_str("productName").map(str::to_string),
                configurations: configuration_list(objects, target)
                    .with_context(|| format!("configurations of target {name}"))?,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            builtins: project_builtins(path, project),
            configurations,
            targets,
        })
    }

    /// Path of the `.xcodeproj` bundle.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn project_settings(&self, configuration: &str) -> Option<&BuildSettings> {
        self.configurations.get(configuration)
    }
}

impl ProjectHandle for PbxProject {
    type Target<'a> = PbxTarget<'a>;

    fn targets(&self) -> Vec<PbxTarget<'_>> {
        self.targets
            .iter()
            .map(|record| PbxTarget {
                project: self,
                record,
            })
            .collect()
    }
}

/// A target of an opened [`PbxProject`].
#[derive(Debug, Clone, Copy)]
pub struct PbxTarget<'a> {
    project: &'a PbxProject,
    record: &'a TargetRecord,
}

impl PbxTarget<'_> {
    /// Resolved value of `key` in every configuration, in declaration order.
    pub fn resolved_build_settings(&self, key: &str) -> Vec<(String, Option<String>)> {
        let empty = BuildSettings::new();
        self.record
            .configurations
            .iter()
            .map(|config| {
                let mut builtins = self.project.builtins.clone();
                builtins.insert("TARGET_NAME".to_string(), self.record.name.clone());
                builtins.insert(
                    "PRODUCT_NAME".to_string(),
                    self.record
                        .product_name
                        .clone()
                        .unwrap_or_else(|| self.record.name.clone()),
                );
                builtins.insert("CONFIGURATION".to_string(), config.name.clone());
                let scope = SettingsScope {
                    target: &config.settings,
                    project: self.project.project_settings(&config.name).unwrap_or(&empty),
                    builtins: &builtins,
                };
                (config.name.clone(), scope.resolve(key))
            })
            .collect()
    }
}

impl TargetHandle for PbxTarget<'_> {
    fn name(&self) -> &str {
        &self.record.name
    }

    fn resolved_build_setting(&self, key: &str) -> Result<Option<String>> {
        let per_config = self.resolved_build_settings(key);
        let mut distinct: Vec<&str> = Vec::new();
        for value in per_config.iter().filter_map(|(_, value)| value.as_deref()) {
            if !distinct.contains(&value) {
                distinct.push(value);
            }
        }
        match distinct.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(single.to_string())),
            _ => {
                let rendered = per_config
                    .iter()
                    .map(|(config, value)| {
                        format!("{config}={}", value.as_deref().unwrap_or("<unset>"))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(anyhow!(
                    "build setting {key} of target {} differs between configurations: {rendered}",
                    self.record.name
                ))
            }
        }
    }
}

fn lookup<'a>(objects: &'a Dictionary, id: &str) -> Result<&'a Value> {
    objects
        .get(id)
        .ok_or_else(|| anyhow!("object {id} referenced but not defined"))
}

fn configuration_list(objects: &Dictionary, owner: &Value) -> Result<Vec<Configuration>> {
    let Some(list_id) = owner.get_str("buildConfigurationList") else {
        return Ok(Vec::new());
    };
    let list = lookup(objects, list_id)?;
    let mut configurations = Vec::new();
    for config_id in list
        .get("buildConfigurations")
        .and_then(Value::as_array)
        .unwrap_or_default()
    {
        let config_id = config_id
            .as_str()
            .ok_or_else(|| anyhow!("build configuration reference is not an object id"))?;
        let config = lookup(objects, config_id)?;
        let name = config
            .get_str("name")
            .ok_or_else(|| anyhow!("build configuration {config_id} has no name"))?;
        let settings = config
            .get("buildSettings")
            .and_then(Value::as_dictionary)
            .map(flatten_settings)
            .unwrap_or_default();
        configurations.push(Configuration {
            name: name.to_string(),
            settings,
        });
    }
    Ok(configurations)
}

// List-valued settings are joined the way xcodebuild joins them.
fn flatten_settings(dict: &Dictionary) -> BuildSettings {
    dict.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(text) => text.clone(),
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
                _ => return None,
            };
            Some((key.clone(), text))
        })
        .collect()
}

fn project_builtins(path: &Path, project: &Value) -> BuildSettings {
    let folder = path.parent().unwrap_or_else(|| Path::new("."));
    let srcroot = match project.get_str("projectDirPath") {
        Some(dir) if !dir.is_empty() => folder.join(dir),
        _ => folder.to_path_buf(),
    };
    let srcroot = srcroot.display().to_string();
    let project_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut builtins = BuildSettings::new();
    builtins.insert("SRCROOT".to_string(), srcroot.clone());
    builtins.insert("PROJECT_DIR".to_string(), srcroot.clone());
    builtins.insert("SOURCE_ROOT".to_string(), srcroot);
    builtins.insert("PROJECT_NAME".to_string(), project_name);
    builtins.insert("PROJECT_FILE_PATH".to_string(), path.display().to_string());
    builtins
}

#[cfg(test)]
#[path = "pbxproj_tests.rs"]
mod tests;
