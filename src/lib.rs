//! Resolve the marketing version of an Xcode project.
//!
//! `agvtool what-marketing-version -terse` prints one `path=version` line per
//! Info.plist. [`resolve::resolve`] picks the line that belongs to the
//! requested target, falling back to a target index built from the project
//! file by [`index::build_index`] when path naming conventions do not apply.
pub mod agvtool;
pub mod cli;
pub mod index;
pub mod lane;
pub mod project;
pub mod resolve;
pub mod util;
pub mod workflow;
