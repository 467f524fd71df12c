//! Shared test infrastructure for integration tests.
//!
//! A fixture is a temp directory holding an Xcode project folder and a mock
//! `agvtool` script that prints canned `-terse` output and records the
//! directory it ran in.
// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Environment bindings that must not leak from the developer's shell.
const ISOLATED_ENV: [&str; 6] = [
    "FL_VERSION_NUMBER_PROJECT",
    "FL_VERSION_NUMBER_TARGET",
    "FL_VERSION_NUMBER_SCHEME",
    "XCVER_LANE_CONTEXT",
    "XCVER_AGVTOOL",
    "RUST_LOG",
];

/// Two-target project: `App` keeps its plist under `App/`, `Widget` uses a
/// custom name that only the target index can associate with it.
pub const TWO_TARGET_PBXPROJ: &str = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	classes = {
	};
	objectVersion = 54;
	objects = {
		AAAA0001 /* App */ = {
			isa = PBXNativeTarget;
			buildConfigurationList = AAAA0002 /* Build configuration list for PBXNativeTarget "App" */;
			name = App;
			productName = App;
		};
		AAAA0002 = {
			isa = XCConfigurationList;
			buildConfigurations = (
				AAAA0003 /* Debug */,
				AAAA0004 /* Release */,
			);
			defaultConfigurationName = Release;
		};
		AAAA0003 /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				INFOPLIST_FILE = App/Info.plist;
			};
			name = Debug;
		};
		AAAA0004 /* Release */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				INFOPLIST_FILE = App/Info.plist;
			};
			name = Release;
		};
		BBBB0001 /* Widget */ = {
			isa = PBXNativeTarget;
			buildConfigurationList = BBBB0002;
			name = Widget;
			productName = Widget;
		};
		BBBB0002 = {
			isa = XCConfigurationList;
			buildConfigurations = (
				BBBB0003 /* Debug */,
			);
		};
		BBBB0003 /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				INFOPLIST_FILE = "$(SRCROOT)/Support/Extension.plist";
			};
			name = Debug;
		};
		CCCC0001 /* Project object */ = {
			isa = PBXProject;
			buildConfigurationList = CCCC0002;
			targets = (
				AAAA0001 /* App */,
				BBBB0001 /* Widget */,
			);
		};
		CCCC0002 = {
			isa = XCConfigurationList;
			buildConfigurations = (
			);
		};
	};
	rootObject = CCCC0001 /* Project object */;
}
"#;

/// Canned agvtool output for [`TWO_TARGET_PBXPROJ`].
pub const TWO_TARGET_OUTPUT: &str = "\
$(SRCROOT)/Stale/Info.plist=0.0.1
\"Sample.xcodeproj/../App/Info.plist\"=1.4.0
\"Support/Extension.plist\"=2.0.3
";

pub struct Fixture {
    pub temp: TempDir,
    pub project_folder: PathBuf,
}

impl Fixture {
    /// Create a project folder named `folder_name` with the given pbxproj
    /// text and a mock agvtool printing `agvtool_output`.
    pub fn new(folder_name: &str, pbxproj: Option<&str>, agvtool_output: &str) -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        let project_folder = temp.path().join(folder_name);
        fs::create_dir_all(&project_folder).expect("create project folder");
        if let Some(pbxproj) = pbxproj {
            let bundle = project_folder.join("Sample.xcodeproj");
            fs::create_dir_all(&bundle).expect("create project bundle");
            fs::write(bundle.join("project.pbxproj"), pbxproj).expect("write pbxproj");
        }
        let fixture = Self {
            temp,
            project_folder,
        };
        fixture.write_agvtool(&format!(
            "#!/bin/sh\n\
             if [ \"$1\" != what-marketing-version ] || [ \"$2\" != -terse ]; then\n\
               echo \"unexpected arguments: $*\" >&2\n\
               exit 2\n\
             fi\n\
             pwd > '{pwd}'\n\
             cat <<'AGV_EOF'\n{agvtool_output}AGV_EOF\n",
            pwd = fixture.pwd_record().display(),
        ));
        fixture
    }

    /// Replace the mock with one that fails like agvtool on a bad project.
    pub fn failing_agvtool(&self) {
        self.write_agvtool(
            "#!/bin/sh\necho 'There does not seem to be a CURRENT_PROJECT_VERSION key set for this project.' >&2\nexit 1\n",
        );
    }

    pub fn agvtool_path(&self) -> PathBuf {
        self.temp.path().join("mock-agvtool.sh")
    }

    pub fn xcodeproj(&self) -> PathBuf {
        self.project_folder.join("Sample.xcodeproj")
    }

    /// Directory the mock agvtool last ran in.
    pub fn recorded_pwd(&self) -> Option<PathBuf> {
        let text = fs::read_to_string(self.pwd_record()).ok()?;
        Some(PathBuf::from(text.trim_end_matches('\n')))
    }

    fn pwd_record(&self) -> PathBuf {
        self.temp.path().join("agvtool-pwd.txt")
    }

    fn write_agvtool(&self, script: &str) {
        let path = self.agvtool_path();
        fs::write(&path, script).expect("write mock agvtool");
        let mut permissions = fs::metadata(&path).expect("stat mock").permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions).expect("chmod mock");
    }

    /// Run xcver with `args`, the mock agvtool, and a clean environment.
    pub fn run(&self, args: &[&str]) -> Output {
        self.run_in(&self.project_folder, args)
    }

    pub fn run_in(&self, cwd: &Path, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_xcver"));
        for key in ISOLATED_ENV {
            command.env_remove(key);
        }
        let agvtool = self.agvtool_path().display().to_string();
        command
            .current_dir(cwd)
            .env("XCVER_AGVTOOL", shell_words::quote(&agvtool).into_owned())
            .args(args)
            .output()
            .expect("run xcver")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Canonical form of a temp path, since `pwd` may report resolved symlinks.
pub fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().expect("canonicalize")
}
