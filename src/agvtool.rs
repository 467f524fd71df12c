//! `agvtool what-marketing-version -terse` invocation.
//!
//! The tool has to run from the project folder, so the command goes through
//! `sh -c "cd <folder> && agvtool ..."`. Every piece of the line is quoted
//! with shell-words before it reaches the shell.
use crate::util::{absolute_path, first_line};
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Default tool command.
pub const DEFAULT_AGVTOOL: &str = "agvtool";

/// Setup guide for projects that agvtool cannot read.
pub const SETUP_GUIDE_URL: &str = "https://developer.apple.com/library/content/qa/qa1827/_index.html";

const QUERY_ARGS: [&str; 2] = ["what-marketing-version", "-terse"];

/// A configured agvtool command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agvtool {
    argv: Vec<String>,
}

impl Agvtool {
    /// Parse a tool command line such as `agvtool` or `xcrun agvtool`.
    pub fn parse(command: &str) -> Result<Self> {
        let argv =
            shell_words::split(command).with_context(|| format!("parse agvtool command: {command}"))?;
        if argv.is_empty() {
            return Err(anyhow!("agvtool command is empty"));
        }
        Ok(Self { argv })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Pin a relative program path such as `./bin/agvtool` to `cwd`.
    ///
    /// The shell runs the tool after `cd` into the project folder, so a
    /// relative path would otherwise be looked up from the wrong place. Bare
    /// names keep going through `PATH`.
    pub fn anchored_to(&self, cwd: &Path) -> Self {
        let program = Path::new(self.program());
        if program.is_absolute() || program.components().count() < 2 {
            return self.clone();
        }
        let mut argv = self.argv.clone();
        argv[0] = absolute_path(program, cwd).to_string_lossy().into_owned();
        Self { argv }
    }

    /// Shell line that runs the version query inside `folder`.
    pub fn shell_line(&self, folder: &Path) -> String {
        let folder = folder.to_string_lossy();
        let tool = shell_words::join(self.argv.iter().map(String::as_str).chain(QUERY_ARGS));
        format!("cd {} && {tool}", shell_words::quote(&folder))
    }

    /// Locate the program, failing with setup guidance when it is missing.
    pub fn locate(&self) -> Result<PathBuf> {
        which::which(self.program()).map_err(|err| {
            anyhow!(
                "cannot find {} ({err}); agvtool ships with the Xcode command line tools. {}",
                self.program(),
                setup_hint()
            )
        })
    }

    /// Run the query in `folder` and return stdout split into lines.
    pub fn marketing_versions(&self, folder: &Path) -> Result<Vec<String>> {
        let cwd = env::current_dir().context("resolve current directory")?;
        let tool = self.anchored_to(&cwd);
        tool.locate()?;
        let line = tool.shell_line(folder);
        tracing::debug!(command = %line, "running agvtool");

        let start = Instant::now();
        let output = Command::new("sh")
            .arg("-c")
            .arg(&line)
            .output()
            .with_context(|| format!("run {line}"))?;
        let elapsed_ms = start.elapsed().as_millis();

        tracing::info!(
            elapsed_ms,
            stdout_bytes = output.stdout.len(),
            status = %output.status,
            "agvtool complete"
        );

        if !output.status.success() {
            let detail = first_line(&output.stderr);
            let detail = if detail.is_empty() {
                format!("status {}", output.status)
            } else {
                detail
            };
            return Err(anyhow!("agvtool failed: {detail}. {}", setup_hint()));
        }

        Ok(split_output(&output.stdout))
    }
}

impl Default for Agvtool {
    fn default() -> Self {
        Self {
            argv: vec![DEFAULT_AGVTOOL.to_string()],
        }
    }
}

/// Split raw tool output into lines, decoding lossily.
pub fn split_output(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

fn setup_hint() -> String {
    format!(
        "Before being able to read the version number from your Xcode project, you first need to set up your project properly. Please follow the guide at {SETUP_GUIDE_URL}"
    )
}
