//! Content-addressed snapshot of the watched tree
//!
//! A snapshot maps every visible regular file to a BLAKE3 fingerprint of its
//! bytes. It is rebuilt from scratch on every scan cycle.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::exclusion::IgnoreRuleSet;
use crate::logging::*;

/// Fixed-size hash of a file's content
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
	pub fn of_bytes(data: &[u8]) -> Self {
		Fingerprint(*blake3::hash(data).as_bytes())
	}

	/// Hash a file by streaming its content
	pub fn of_file(path: &Path) -> io::Result<Self> {
		let mut file = fs::File::open(path)?;
		let mut hasher = blake3::Hasher::new();
		io::copy(&mut file, &mut hasher)?;
		Ok(Fingerprint(*hasher.finalize().as_bytes()))
	}

	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}

	pub fn to_hex(&self) -> String {
		hex::encode(self.0)
	}
}

impl fmt::Debug for Fingerprint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Fingerprint({})", &self.to_hex()[..12])
	}
}

impl fmt::Display for Fingerprint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

/// Absolute path -> content fingerprint
pub type Snapshot = BTreeMap<PathBuf, Fingerprint>;

/// Traversal settings
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// Name of the version-control metadata directory, always pruned
	pub metadata_dir_name: String,

	/// Name of the per-directory ignore-rule file
	pub ignore_file_name: String,
}

impl Default for ScanOptions {
	fn default() -> Self {
		ScanOptions { metadata_dir_name: ".git".to_string(), ignore_file_name: ".gitignore".to_string() }
	}
}

impl From<&Config> for ScanOptions {
	fn from(config: &Config) -> Self {
		ScanOptions {
			metadata_dir_name: config.vcs_metadata_dir_name.clone(),
			ignore_file_name: config.ignore_file_name.clone(),
		}
	}
}

/// Walk `root` and fingerprint every file that is not excluded
///
/// Rule files are discovered as their directory is entered and appended to
/// `rules`, so they only affect paths visited after that point. Entries that
/// vanish or cannot be read are left out of the snapshot.
pub fn build(root: &Path, rules: &mut IgnoreRuleSet, options: &ScanOptions) -> Snapshot {
	let mut snapshot = Snapshot::new();
	walk_dir(root, rules, options, &mut snapshot);
	snapshot
}

fn walk_dir(dir: &Path, rules: &mut IgnoreRuleSet, options: &ScanOptions, snapshot: &mut Snapshot) {
	rules.discover(dir, &options.ignore_file_name);

	let entries = match fs::read_dir(dir) {
		Ok(e) => e,
		Err(e) => {
			debug!("Cannot read directory {}: {}", dir.display(), e);
			return;
		}
	};

	let mut entries: Vec<fs::DirEntry> = entries
		.filter_map(|entry| match entry {
			Ok(e) => Some(e),
			Err(e) => {
				debug!("Error reading directory entry: {}", e);
				None
			}
		})
		.collect();
	entries.sort_by_key(|e| e.file_name());

	for entry in entries {
		if entry.file_name() == options.metadata_dir_name.as_str() {
			continue;
		}

		let path = entry.path();
		if rules.is_ignored(&path) {
			continue;
		}

		// file_type() does not follow symlinks
		let file_type = match entry.file_type() {
			Ok(t) => t,
			Err(e) => {
				debug!("Cannot access {}: {}", path.display(), e);
				continue;
			}
		};

		if file_type.is_dir() {
			walk_dir(&path, rules, options, snapshot);
		} else if file_type.is_file() {
			match Fingerprint::of_file(&path) {
				Ok(fingerprint) => {
					snapshot.insert(path, fingerprint);
				}
				Err(e) => {
					debug!("Skipping {}: {}", path.display(), e);
				}
			}
		}
	}
}


// vim: ts=4
