//! Serialized remote-sync dispatch
//!
//! Every path is published with its own stage -> commit -> push sequence. A
//! single process-wide lock guards those sequences together with the registry
//! of paths already synced as deleted.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::VcsError;
use crate::exclusion::IgnoreRuleSet;
use crate::logging::*;
use crate::vcs::{CommitOutcome, VcsCollaborator, VcsResult};

/// Kind of change being published for one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
	Create,
	Update,
	Delete,
}

impl SyncAction {
	/// Past-tense verb used in commit messages
	pub fn verb(&self) -> &'static str {
		match self {
			SyncAction::Create => "Created",
			SyncAction::Update => "Updated",
			SyncAction::Delete => "Deleted",
		}
	}

	/// Commit message for `path`, e.g. "Created notes.md"
	pub fn commit_message(&self, path: &Path) -> String {
		let name = path.file_name().unwrap_or_else(|| path.as_os_str());
		format!("{} {}", self.verb(), name.to_string_lossy())
	}
}

impl fmt::Display for SyncAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			SyncAction::Create => "create",
			SyncAction::Update => "update",
			SyncAction::Delete => "delete",
		};
		f.write_str(name)
	}
}

/// Paths already published as deleted; only ever grows
#[derive(Debug, Default)]
pub struct DeletedPathRegistry {
	paths: BTreeSet<PathBuf>,
}

impl DeletedPathRegistry {
	pub fn contains(&self, path: &Path) -> bool {
		self.paths.contains(path)
	}

	/// Record `path`; returns false if it was already present
	pub fn mark(&mut self, path: &Path) -> bool {
		self.paths.insert(path.to_path_buf())
	}

	pub fn len(&self) -> usize {
		self.paths.len()
	}

	pub fn is_empty(&self) -> bool {
		self.paths.is_empty()
	}
}

/// What happened to one dispatch request
#[derive(Debug)]
pub enum DispatchOutcome {
	/// Staged, committed and pushed
	Synced(CommitOutcome),

	/// Delete for a path already synced as deleted; nothing was run
	AlreadyDeleted,

	/// Delete for a path that is now ignored; recorded without contacting the remote
	Ignored,

	/// A protocol step failed; later steps were skipped
	Failed(VcsError),
}

impl DispatchOutcome {
	pub fn is_success(&self) -> bool {
		!matches!(self, DispatchOutcome::Failed(_))
	}
}

/// Publishes changed paths one at a time
pub struct SyncDispatcher {
	/// Repository root; collaborator paths are relative to it
	root: PathBuf,

	vcs: Arc<dyn VcsCollaborator>,

	/// Sync lock. Holding the guard is the right to talk to the collaborator.
	registry: Mutex<DeletedPathRegistry>,
}

impl SyncDispatcher {
	pub fn new(root: &Path, vcs: Arc<dyn VcsCollaborator>) -> Self {
		SyncDispatcher { root: root.to_path_buf(), vcs, registry: Mutex::new(DeletedPathRegistry::default()) }
	}

	/// Publish one change of `path` (absolute)
	///
	/// Blocks until the sync lock is free. Failures are reported and returned,
	/// never propagated.
	pub async fn dispatch(
		&self,
		path: &Path,
		action: SyncAction,
		rules: &IgnoreRuleSet,
	) -> DispatchOutcome {
		let mut registry = self.registry.lock().await;
		let relative = path.strip_prefix(&self.root).unwrap_or(path);

		if action == SyncAction::Delete {
			if registry.contains(path) {
				debug!("{} already synced as deleted", relative.display());
				return DispatchOutcome::AlreadyDeleted;
			}
			if rules.is_ignored(path) {
				debug!("{} is ignored, not syncing its deletion", relative.display());
				registry.mark(path);
				return DispatchOutcome::Ignored;
			}
		}

		let message = action.commit_message(path);
		let outcome = match self.publish(relative, action, &message).await {
			Ok(commit) => {
				if action == SyncAction::Delete {
					registry.mark(path);
				}
				DispatchOutcome::Synced(commit)
			}
			Err(e) => DispatchOutcome::Failed(e),
		};

		report(relative, action, &outcome);
		outcome
	}

	/// Number of paths recorded as deleted so far
	pub async fn deleted_count(&self) -> usize {
		self.registry.lock().await.len()
	}

	/// Whether `path` (absolute) has been recorded as deleted
	pub async fn is_marked_deleted(&self, path: &Path) -> bool {
		self.registry.lock().await.contains(path)
	}

	async fn publish(
		&self,
		relative: &Path,
		action: SyncAction,
		message: &str,
	) -> VcsResult<CommitOutcome> {
		match action {
			SyncAction::Delete => self.vcs.remove(relative).await?,
			SyncAction::Create | SyncAction::Update => self.vcs.stage(relative).await?,
		}
		let commit = self.vcs.commit(message).await?;
		if commit == CommitOutcome::NothingToCommit {
			debug!("Nothing to commit for {}", relative.display());
		}
		self.vcs.push().await?;
		Ok(commit)
	}
}

/// Console and log output for a finished dispatch
fn report(relative: &Path, action: SyncAction, outcome: &DispatchOutcome) {
	match outcome {
		DispatchOutcome::Synced(_) => {
			info!(path = %relative.display(), %action, "synced");
			match action {
				SyncAction::Delete => println!("Deleted {}", relative.display()),
				_ => println!("Pushed {}", relative.display()),
			}
		}
		DispatchOutcome::Failed(e) => {
			error!(path = %relative.display(), %action, "sync failed: {}", e);
			eprintln!("Failed to {} {}: {}", e.step(), relative.display(), e);
		}
		DispatchOutcome::AlreadyDeleted | DispatchOutcome::Ignored => {}
	}
}


// vim: ts=4
