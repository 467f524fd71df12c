//! CLI argument parsing for version lookup.
//!
//! Flags mirror the environment bindings used by existing build pipelines,
//! so either can drive a run.
use crate::agvtool::DEFAULT_AGVTOOL;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "xcver",
    version,
    about = "Report the marketing version of an Xcode project",
    after_help = "Commands:\n  get                  Resolve the marketing version via agvtool\n  targets              List targets and their Info.plist paths\n\nExamples:\n  xcver get\n  xcver get --xcodeproj App/App.xcodeproj --target App\n  xcver get --target Widget --lane-context build/lane.json\n  xcver targets --xcodeproj App/App.xcodeproj --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Emit debug diagnostics on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Get(GetArgs),
    Targets(TargetsArgs),
}

/// Project location shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Path to the Xcode project, when it is not in the current directory
    #[arg(long, value_name = "PATH", env = "FL_VERSION_NUMBER_PROJECT")]
    pub xcodeproj: Option<PathBuf>,
}

/// Resolve the marketing version.
#[derive(Parser, Debug)]
#[command(about = "Resolve the marketing version via agvtool")]
pub struct GetArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Target whose version to report, when the project has several
    #[arg(long, value_name = "NAME", env = "FL_VERSION_NUMBER_TARGET")]
    pub target: Option<String>,

    /// Deprecated: use --target. Behavior is undefined if the scheme name
    /// does not match the target name
    #[arg(long, value_name = "NAME", env = "FL_VERSION_NUMBER_SCHEME")]
    pub scheme: Option<String>,

    /// JSON object file that receives VERSION_NUMBER for later steps
    #[arg(long, value_name = "PATH", env = "XCVER_LANE_CONTEXT")]
    pub lane_context: Option<PathBuf>,

    /// agvtool command line
    #[arg(long, value_name = "CMD", env = "XCVER_AGVTOOL", default_value = DEFAULT_AGVTOOL)]
    pub agvtool: String,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// List the target index.
#[derive(Parser, Debug)]
#[command(about = "List targets and their resolved Info.plist paths")]
pub struct TargetsArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn parses_get_with_hints() {
        let args = RootArgs::try_parse_from([
            "xcver",
            "get",
            "--xcodeproj",
            "App/App.xcodeproj",
            "--target",
            "App",
            "--json",
            "--verbose",
        ])
        .expect("parse");
        assert!(args.verbose);
        let Command::Get(get) = args.command else {
            panic!("expected get");
        };
        assert_eq!(get.project.xcodeproj, Some(PathBuf::from("App/App.xcodeproj")));
        assert_eq!(get.target.as_deref(), Some("App"));
        assert!(get.json);
    }

    #[test]
    fn targets_defaults_to_text_output() {
        let args = RootArgs::try_parse_from(["xcver", "targets"]).expect("parse");
        let Command::Targets(targets) = args.command else {
            panic!("expected targets");
        };
        assert!(!targets.json);
        assert!(RootArgs::try_parse_from(["xcver", "targets", "--output", "json"]).is_err());
    }

    #[test]
    fn requires_a_subcommand() {
        assert!(RootArgs::try_parse_from(["xcver"]).is_err());
    }
}
