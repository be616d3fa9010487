//! Background scan loop
//!
//! Alternates between sleeping for the poll interval and a scanning cycle:
//! rebuild the snapshot, diff it against the previous one, dispatch every
//! change and publish a change event.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::diff::{diff, DiffResult};
use crate::dispatch::SyncDispatcher;
use crate::exclusion::IgnoreRuleSet;
use crate::logging::*;
use crate::snapshot::{self, ScanOptions, Snapshot};

/// Single-slot change notification
///
/// Carries the number of the last cycle that found changes. Consumers only
/// see the latest value, so bursts collapse into one wakeup.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
	tx: Arc<watch::Sender<u64>>,
}

impl ChangeNotifier {
	pub fn new() -> Self {
		let (tx, _rx) = watch::channel(0);
		ChangeNotifier { tx: Arc::new(tx) }
	}

	pub fn subscribe(&self) -> watch::Receiver<u64> {
		self.tx.subscribe()
	}

	pub fn publish(&self, cycle: u64) {
		self.tx.send_replace(cycle);
	}
}

impl Default for ChangeNotifier {
	fn default() -> Self {
		Self::new()
	}
}

/// Owner of the current snapshot and of the accumulated ignore rules
pub struct ScanLoop {
	root: PathBuf,
	options: ScanOptions,
	interval: Duration,
	skip_existing: bool,
	rules: IgnoreRuleSet,
	snapshot: Snapshot,
	dispatcher: Arc<SyncDispatcher>,
	notifier: ChangeNotifier,
	cycle: u64,
}

impl ScanLoop {
	pub fn new(
		root: &Path,
		config: &Config,
		dispatcher: Arc<SyncDispatcher>,
		notifier: ChangeNotifier,
	) -> Self {
		ScanLoop {
			root: root.to_path_buf(),
			options: ScanOptions::from(config),
			interval: config.interval_duration(),
			skip_existing: config.skip_existing_on_start,
			rules: IgnoreRuleSet::new(),
			snapshot: Snapshot::new(),
			dispatcher,
			notifier,
			cycle: 0,
		}
	}

	pub fn snapshot(&self) -> &Snapshot {
		&self.snapshot
	}

	pub fn rules(&self) -> &IgnoreRuleSet {
		&self.rules
	}

	/// Take the current tree as the baseline without dispatching anything
	pub async fn prime(&mut self) {
		self.snapshot = self.rebuild().await;
		info!("Tracking {} file(s) under {}", self.snapshot.len(), self.root.display());
	}

	/// Set up the startup baseline
	///
	/// The baseline is empty, so the first cycle publishes every existing file,
	/// unless the configuration asks to skip existing files.
	pub async fn establish_baseline(&mut self) {
		if self.skip_existing {
			self.prime().await;
		} else {
			self.snapshot = Snapshot::new();
			debug!("Starting from an empty baseline under {}", self.root.display());
		}
	}

	/// Run one scanning cycle and return what changed
	///
	/// All dispatches for the cycle complete before the snapshot is replaced.
	pub async fn scan_once(&mut self) -> DiffResult {
		let current = self.rebuild().await;
		let changes = diff(&self.snapshot, &current);
		if changes.is_empty() {
			return changes;
		}

		self.cycle += 1;
		debug!(
			cycle = self.cycle,
			added = changes.added.len(),
			deleted = changes.deleted.len(),
			modified = changes.modified.len(),
			"changes detected"
		);

		let dispatcher = &self.dispatcher;
		let rules = &self.rules;
		let outcomes = join_all(
			changes.changes().map(move |(path, action)| dispatcher.dispatch(path, action, rules)),
		)
		.await;
		let failed = outcomes.iter().filter(|o| !o.is_success()).count();
		if failed > 0 {
			warn!("{} of {} change(s) failed to sync", failed, outcomes.len());
		}

		self.snapshot = current;
		self.notifier.publish(self.cycle);
		changes
	}

	/// Scan every interval until `shutdown` turns true
	///
	/// Shutdown is only observed between cycles; a running cycle finishes.
	pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
		let mut ticker = tokio::time::interval(self.interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		// the first tick fires immediately
		ticker.tick().await;

		while !*shutdown.borrow() {
			tokio::select! {
				_ = ticker.tick() => {
					self.scan_once().await;
				}
				changed = shutdown.changed() => {
					if changed.is_err() {
						break;
					}
				}
			}
		}

		debug!("Scan loop stopped after {} change cycle(s)", self.cycle);
	}

	/// Build a fresh snapshot off the async runtime
	///
	/// The rule set is moved into the blocking task and handed back with the
	/// snapshot.
	async fn rebuild(&mut self) -> Snapshot {
		let root = self.root.clone();
		let options = self.options.clone();
		let mut rules = std::mem::take(&mut self.rules);

		let result = tokio::task::spawn_blocking(move || {
			let snapshot = snapshot::build(&root, &mut rules, &options);
			(snapshot, rules)
		})
		.await;

		match result {
			Ok((snapshot, rules)) => {
				self.rules = rules;
				snapshot
			}
			Err(e) => {
				// rules are rediscovered on the next walk
				error!("Snapshot task failed: {}", e);
				self.snapshot.clone()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_notifier_keeps_latest_value() {
		let notifier = ChangeNotifier::new();
		let mut rx = notifier.subscribe();

		notifier.publish(1);
		notifier.publish(2);
		notifier.publish(3);

		assert!(rx.has_changed().unwrap());
		rx.changed().await.unwrap();
		assert_eq!(*rx.borrow(), 3);
		assert!(!rx.has_changed().unwrap());
	}

	#[test]
	fn test_publish_without_subscribers() {
		let notifier = ChangeNotifier::default();
		notifier.publish(7);
		assert_eq!(*notifier.subscribe().borrow(), 7);
	}
}

// vim: ts=4
