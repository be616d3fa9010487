//! Error types for autopush operations

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Main error type, surfaced to the entry point only during startup
#[derive(Debug)]
pub enum AutopushError {
	/// Watch root does not hold a version-control metadata directory
	NotARepository { path: PathBuf },

	/// Invalid configuration
	InvalidConfig { message: String },

	/// I/O error
	Io(io::Error),
}

impl fmt::Display for AutopushError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AutopushError::NotARepository { path } => {
				write!(f, "Directory is not a git repo: {}", path.display())
			}
			AutopushError::InvalidConfig { message } => {
				write!(f, "Invalid configuration: {}", message)
			}
			AutopushError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for AutopushError {}

impl From<io::Error> for AutopushError {
	fn from(e: io::Error) -> Self {
		AutopushError::Io(e)
	}
}

/// One step of the stage -> commit -> push protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsStep {
	Stage,
	Remove,
	Commit,
	Push,
}

impl fmt::Display for VcsStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			VcsStep::Stage => "stage",
			VcsStep::Remove => "remove",
			VcsStep::Commit => "commit",
			VcsStep::Push => "push",
		};
		f.write_str(name)
	}
}

/// Errors reported by the external version-control tool
#[derive(Debug)]
pub enum VcsError {
	/// The tool could not be started at all
	Spawn { step: VcsStep, source: io::Error },

	/// The tool exited with a non-zero status
	Failed { step: VcsStep, status: Option<i32>, stderr: String },

	/// The tool's own lock file did not go away in time
	LockTimeout { path: PathBuf },
}

impl VcsError {
	/// Protocol step that failed
	pub fn step(&self) -> VcsStep {
		match self {
			VcsError::Spawn { step, .. } => *step,
			VcsError::Failed { step, .. } => *step,
			VcsError::LockTimeout { .. } => VcsStep::Stage,
		}
	}
}

impl fmt::Display for VcsError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			VcsError::Spawn { step, source } => {
				write!(f, "failed to run {} command: {}", step, source)
			}
			VcsError::Failed { step, status: Some(code), stderr } => {
				write!(f, "{} exited with status {}: {}", step, code, stderr)
			}
			VcsError::Failed { step, status: None, stderr } => {
				write!(f, "{} terminated by signal: {}", step, stderr)
			}
			VcsError::LockTimeout { path } => {
				write!(f, "repository lock {} still held", path.display())
			}
		}
	}
}

impl Error for VcsError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			VcsError::Spawn { source, .. } => Some(source),
			_ => None,
		}
	}
}


// vim: ts=4
