//! External version-control collaborator
//!
//! The sync engine only depends on the [`VcsCollaborator`] trait. [`GitCli`]
//! drives the `git` command line tool as an opaque subprocess.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use crate::config::Config;
use crate::error::{VcsError, VcsStep};
use crate::logging::*;

/// Result type for collaborator operations
pub type VcsResult<T> = Result<T, VcsError>;

/// Interval between checks of the tool's index lock
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a successful commit step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
	/// A new commit was recorded
	Committed,
	/// The repository already matched the staged state
	NothingToCommit,
}

/// The three-step protocol used to publish one path
///
/// Implementations are not expected to be safe for concurrent use against the
/// same repository; the dispatcher serializes every call.
#[async_trait]
pub trait VcsCollaborator: Send + Sync {
	/// Stage a created or modified path (relative to the repository root)
	async fn stage(&self, path: &Path) -> VcsResult<()>;

	/// Stage the removal of a deleted path
	async fn remove(&self, path: &Path) -> VcsResult<()> {
		self.stage(path).await
	}

	/// Record staged changes
	async fn commit(&self, message: &str) -> VcsResult<CommitOutcome>;

	/// Publish local commits to the remote
	async fn push(&self) -> VcsResult<()>;
}

/// Check whether `root` holds a version-control metadata directory
pub fn is_repository(root: &Path, metadata_dir_name: &str) -> bool {
	root.join(metadata_dir_name).is_dir()
}

/// `git` subprocess driver
#[derive(Debug, Clone)]
pub struct GitCli {
	/// Program to run (usually "git")
	program: String,

	/// Repository root, used as working directory for every command
	workdir: PathBuf,

	/// Lock file the tool holds while it updates its index
	index_lock: PathBuf,

	/// Remote to push to (tool default when unset)
	remote: Option<String>,

	/// Branch to push (tool default when unset)
	branch: Option<String>,

	/// How long to wait for a foreign index lock before failing the stage step
	lock_wait: Duration,
}

impl GitCli {
	pub fn new(root: &Path, config: &Config) -> Self {
		Self {
			program: config.vcs_program.clone(),
			workdir: root.to_path_buf(),
			index_lock: root.join(&config.vcs_metadata_dir_name).join("index.lock"),
			remote: config.remote.clone(),
			branch: config.branch.clone(),
			lock_wait: config.lock_wait_duration(),
		}
	}

	/// Run one command, returning its output only if it exited successfully
	async fn run(&self, step: VcsStep, args: &[&str]) -> VcsResult<Output> {
		debug!("{} {}", self.program, args.join(" "));

		let mut command = Command::new(&self.program);
		command.args(args).current_dir(&self.workdir).stdin(Stdio::null());
		// keep terminal interrupts away from a running step
		#[cfg(unix)]
		command.process_group(0);

		let output =
			command.output().await.map_err(|source| VcsError::Spawn { step, source })?;

		if output.status.success() {
			Ok(output)
		} else {
			Err(VcsError::Failed {
				step,
				status: output.status.code(),
				stderr: diagnostic_text(&output),
			})
		}
	}

	/// Wait until no other process holds the index lock
	async fn wait_for_index_lock(&self) -> VcsResult<()> {
		let deadline = tokio::time::Instant::now() + self.lock_wait;

		while self.index_lock.exists() {
			if tokio::time::Instant::now() >= deadline {
				return Err(VcsError::LockTimeout { path: self.index_lock.clone() });
			}
			debug!("Waiting for {} to be released", self.index_lock.display());
			tokio::time::sleep(LOCK_POLL_INTERVAL).await;
		}

		Ok(())
	}

	/// Whether the index differs from HEAD
	///
	/// `diff --cached --quiet` exits 1 when something is staged. Any other
	/// failure is left for the commit itself to report.
	async fn has_staged_changes(&self) -> VcsResult<bool> {
		match self.run(VcsStep::Commit, &["diff", "--cached", "--quiet"]).await {
			Ok(_) => Ok(false),
			Err(VcsError::Failed { status: Some(1), .. }) => Ok(true),
			Err(e @ VcsError::Spawn { .. }) => Err(e),
			Err(e) => {
				debug!("Cannot inspect the index: {}", e);
				Ok(true)
			}
		}
	}
}

#[async_trait]
impl VcsCollaborator for GitCli {
	async fn stage(&self, path: &Path) -> VcsResult<()> {
		self.wait_for_index_lock().await?;
		let path = path.to_string_lossy().into_owned();
		self.run(VcsStep::Stage, &["add", "--", path.as_str()]).await?;
		Ok(())
	}

	async fn remove(&self, path: &Path) -> VcsResult<()> {
		self.wait_for_index_lock().await?;
		let path = path.to_string_lossy().into_owned();
		self.run(VcsStep::Remove, &["rm", "--cached", "--ignore-unmatch", "--quiet", "--", path.as_str()])
			.await?;
		Ok(())
	}

	async fn commit(&self, message: &str) -> VcsResult<CommitOutcome> {
		if !self.has_staged_changes().await? {
			return Ok(CommitOutcome::NothingToCommit);
		}

		match self.run(VcsStep::Commit, &["commit", "-m", message]).await {
			Ok(_) => Ok(CommitOutcome::Committed),
			Err(e) if is_nothing_to_commit(&e) => Ok(CommitOutcome::NothingToCommit),
			Err(e) => Err(e),
		}
	}

	async fn push(&self) -> VcsResult<()> {
		let mut args = vec!["push"];
		if let Some(remote) = &self.remote {
			args.push(remote.as_str());
			if let Some(branch) = &self.branch {
				args.push(branch.as_str());
			}
		}
		self.run(VcsStep::Push, &args).await?;
		Ok(())
	}
}

/// Error text of a failed command; git reports some failures on stdout only
fn diagnostic_text(output: &Output) -> String {
	let stderr = String::from_utf8_lossy(&output.stderr);
	if !stderr.trim().is_empty() {
		return stderr.trim().to_string();
	}
	String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A commit that found nothing staged is not a failure
fn is_nothing_to_commit(error: &VcsError) -> bool {
	match error {
		VcsError::Failed { step: VcsStep::Commit, stderr, .. } => {
			stderr.contains("nothing to commit")
				|| stderr.contains("nothing added to commit")
				|| stderr.contains("no changes added to commit")
		}
		_ => false,
	}
}


// vim: ts=4
