//! Per-directory ignore-rule files and the accumulated rule set

use super::{ExclusionError, ScopedPattern};
use crate::logging::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Accumulated ignore patterns for the lifetime of the process
///
/// Patterns are only ever appended. Rule files are re-read on every discovery
/// pass and lines not seen before are added; removing a line from a file does
/// not remove its pattern until restart.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRuleSet {
	/// Patterns in discovery order
	patterns: Vec<ScopedPattern>,

	/// Lines already taken from each rule file
	loaded: BTreeMap<PathBuf, BTreeSet<String>>,
}

impl IgnoreRuleSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.patterns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.patterns.is_empty()
	}

	pub fn patterns(&self) -> &[ScopedPattern] {
		&self.patterns
	}

	/// Append a single pattern scoped to `scope`
	pub fn add_pattern(&mut self, scope: &Path, pattern: &str) -> Result<(), ExclusionError> {
		self.patterns.push(ScopedPattern::new(scope, pattern)?);
		Ok(())
	}

	/// Load new lines of the rule file `dir/file_name` if it exists
	///
	/// Returns the number of patterns appended. Unreadable files and invalid
	/// lines are logged and skipped; a skipped line is not retried.
	pub fn discover(&mut self, dir: &Path, file_name: &str) -> usize {
		let rule_file = dir.join(file_name);
		if !rule_file.is_file() {
			return 0;
		}

		let lines = match IgnoreFileParser::parse_file(&rule_file) {
			Ok(lines) => lines,
			Err(e) => {
				warn!("{}", e);
				return 0;
			}
		};
		let seen = self.loaded.entry(rule_file.clone()).or_default();
		let fresh: Vec<String> = lines.into_iter().filter(|line| seen.insert(line.clone())).collect();
		if fresh.is_empty() {
			return 0;
		}

		let before = self.patterns.len();
		for line in fresh {
			if line.starts_with('!') {
				debug!("Negated pattern {:?} in {} is not supported", line, rule_file.display());
				continue;
			}
			if let Err(e) = self.add_pattern(dir, &line) {
				warn!("Skipping pattern in {}: {}", rule_file.display(), e);
			}
		}

		let added = self.patterns.len() - before;
		debug!("Loaded {} ignore pattern(s) from {}", added, rule_file.display());
		added
	}

	/// Check if `path` is excluded by any accumulated pattern
	pub fn is_ignored(&self, path: &Path) -> bool {
		self.patterns.iter().any(|p| p.matches(path))
	}
}

/// Parser for individual ignore files
pub struct IgnoreFileParser;

impl IgnoreFileParser {
	/// Parse a single ignore file and return patterns
	pub fn parse_file(path: &Path) -> Result<Vec<String>, ExclusionError> {
		let contents = std::fs::read_to_string(path).map_err(|e| {
			ExclusionError::IgnoreFileError(format!("Failed to read {}: {}", path.display(), e))
		})?;

		Ok(Self::parse_contents(&contents))
	}

	/// Parse ignore file contents
	pub fn parse_contents(contents: &str) -> Vec<String> {
		contents
			.lines()
			.filter_map(|line| {
				let line = line.trim_end();

				// Skip empty lines and comments
				if line.trim().is_empty() || line.starts_with('#') {
					return None;
				}

				Some(line.trim_start().to_string())
			})
			.collect()
	}
}
