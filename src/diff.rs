//! Snapshot comparison

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::dispatch::SyncAction;
use crate::snapshot::Snapshot;

/// Classification of the differences between two snapshots
///
/// The three sets are disjoint: a path is added (only in the new snapshot),
/// deleted (only in the old one) or modified (in both, fingerprints differ).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
	pub added: BTreeSet<PathBuf>,
	pub deleted: BTreeSet<PathBuf>,
	pub modified: BTreeSet<PathBuf>,
}

impl DiffResult {
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
	}

	pub fn len(&self) -> usize {
		self.added.len() + self.deleted.len() + self.modified.len()
	}

	/// Every changed path paired with the sync action it calls for
	pub fn changes(&self) -> impl Iterator<Item = (&Path, SyncAction)> + '_ {
		let added = self.added.iter().map(|p| (p.as_path(), SyncAction::Create));
		let deleted = self.deleted.iter().map(|p| (p.as_path(), SyncAction::Delete));
		let modified = self.modified.iter().map(|p| (p.as_path(), SyncAction::Update));
		added.chain(deleted).chain(modified)
	}
}

/// Compare two snapshots in a single ordered pass over both
pub fn diff(old: &Snapshot, new: &Snapshot) -> DiffResult {
	let mut result = DiffResult::default();
	let mut old_iter = old.iter().peekable();
	let mut new_iter = new.iter().peekable();

	loop {
		let order = match (old_iter.peek(), new_iter.peek()) {
			(None, None) => break,
			(Some(_), None) => Ordering::Less,
			(None, Some(_)) => Ordering::Greater,
			(Some((old_path, _)), Some((new_path, _))) => old_path.cmp(new_path),
		};

		match order {
			Ordering::Less => {
				if let Some((path, _)) = old_iter.next() {
					result.deleted.insert(path.clone());
				}
			}
			Ordering::Greater => {
				if let Some((path, _)) = new_iter.next() {
					result.added.insert(path.clone());
				}
			}
			Ordering::Equal => {
				if let (Some((path, old_fp)), Some((_, new_fp))) = (old_iter.next(), new_iter.next()) {
					if old_fp != new_fp {
						result.modified.insert(path.clone());
					}
				}
			}
		}
	}

	result
}
