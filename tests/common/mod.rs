//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use autopush::vcs::{CommitOutcome, VcsCollaborator, VcsResult};
use autopush::{VcsError, VcsStep};

/// One call made against the collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	Stage(PathBuf),
	Remove(PathBuf),
	Commit(String),
	Push,
}

/// Collaborator stub that records every call and can fail a chosen step
#[derive(Default)]
pub struct RecordingVcs {
	calls: Mutex<Vec<Call>>,
	fail_on: Mutex<Option<VcsStep>>,
	step_delay: Option<Duration>,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
}

impl RecordingVcs {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sleep inside every step to widen any race window
	pub fn with_step_delay(delay: Duration) -> Self {
		RecordingVcs { step_delay: Some(delay), ..Self::default() }
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().unwrap().clone()
	}

	pub fn call_count(&self) -> usize {
		self.calls.lock().unwrap().len()
	}

	pub fn fail_on(&self, step: Option<VcsStep>) {
		*self.fail_on.lock().unwrap() = step;
	}

	/// Highest number of steps ever observed running at once
	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight.load(Ordering::SeqCst)
	}

	async fn step(&self, step: VcsStep, call: Call) -> VcsResult<()> {
		let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_in_flight.fetch_max(running, Ordering::SeqCst);

		self.calls.lock().unwrap().push(call);
		if let Some(delay) = self.step_delay {
			tokio::time::sleep(delay).await;
		}
		let fail = *self.fail_on.lock().unwrap() == Some(step);

		self.in_flight.fetch_sub(1, Ordering::SeqCst);
		if fail {
			return Err(VcsError::Failed {
				step,
				status: Some(1),
				stderr: format!("simulated {} failure", step),
			});
		}
		Ok(())
	}
}

#[async_trait]
impl VcsCollaborator for RecordingVcs {
	async fn stage(&self, path: &Path) -> VcsResult<()> {
		self.step(VcsStep::Stage, Call::Stage(path.to_path_buf())).await
	}

	async fn remove(&self, path: &Path) -> VcsResult<()> {
		self.step(VcsStep::Remove, Call::Remove(path.to_path_buf())).await
	}

	async fn commit(&self, message: &str) -> VcsResult<CommitOutcome> {
		self.step(VcsStep::Commit, Call::Commit(message.to_string())).await?;
		Ok(CommitOutcome::Committed)
	}

	async fn push(&self) -> VcsResult<()> {
		self.step(VcsStep::Push, Call::Push).await
	}
}

/// Create a canonical temp root that looks like a repository
pub fn repo_root(dir: &tempfile::TempDir) -> PathBuf {
	let root = fs::canonicalize(dir.path()).unwrap();
	fs::create_dir_all(root.join(".git")).unwrap();
	root
}

/// Write a file, creating parent directories
pub fn write_file(root: &Path, name: &str, content: &str) -> PathBuf {
	let path = root.join(name);
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).unwrap();
	}
	fs::write(&path, content).unwrap();
	path
}

/// The calls a successful publish of `name` makes
pub fn published(name: &str, verb: &str) -> Vec<Call> {
	let basename = Path::new(name).file_name().unwrap().to_string_lossy().into_owned();
	let first = if verb == "Deleted" {
		Call::Remove(PathBuf::from(name))
	} else {
		Call::Stage(PathBuf::from(name))
	};
	vec![first, Call::Commit(format!("{} {}", verb, basename)), Call::Push]
}
