//! Directory-scoped glob patterns

use super::ExclusionError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};

/// A single ignore pattern bound to the directory of its rule file
///
/// A leading `/` anchors the pattern to `scope`. Anything else matches at any
/// depth below `scope`, and a bare name also covers everything beneath a
/// directory of that name.
#[derive(Debug, Clone)]
pub struct ScopedPattern {
	/// Original pattern string, as written in the rule file
	pub pattern: String,

	/// Directory the pattern applies to (and below)
	pub scope: PathBuf,

	/// Whether this pattern is anchored to `scope`
	pub anchored: bool,

	/// Globs tried against the path relative to `scope`
	relative_set: GlobSet,

	/// Glob tried against the final path segment (unanchored, single-segment patterns)
	name_set: Option<GlobSet>,
}

impl ScopedPattern {
	/// Compile `pattern` for use below `scope`
	pub fn new(scope: &Path, pattern: &str) -> Result<Self, ExclusionError> {
		let trimmed = pattern.trim();
		let anchored = trimmed.starts_with('/');
		let body = trimmed.trim_start_matches('/').trim_end_matches('/');

		if body.is_empty() {
			return Err(ExclusionError::InvalidPattern(format!("{:?}: empty pattern", pattern)));
		}

		let relative = if anchored {
			vec![body.to_string(), format!("{}/**", body)]
		} else {
			vec![format!("**/{}", body), format!("**/{}/**", body)]
		};
		let relative_set = build_glob_set(&relative)?;

		let name_set = if !anchored && !body.contains('/') {
			Some(build_glob_set(&[body.to_string()])?)
		} else {
			None
		};

		Ok(Self {
			pattern: trimmed.to_string(),
			scope: scope.to_path_buf(),
			anchored,
			relative_set,
			name_set,
		})
	}

	/// Check whether `path` is excluded by this pattern
	///
	/// Paths outside of `scope` never match.
	pub fn matches(&self, path: &Path) -> bool {
		let relative = match path.strip_prefix(&self.scope) {
			Ok(rel) => rel,
			Err(_) => return false,
		};
		if relative.as_os_str().is_empty() {
			return false;
		}

		if self.relative_set.is_match(relative) {
			return true;
		}

		match (&self.name_set, relative.file_name()) {
			(Some(set), Some(name)) => set.is_match(Path::new(name)),
			_ => false,
		}
	}
}

/// Build a GlobSet where `*` and `?` never cross a path separator
fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ExclusionError> {
	let mut builder = GlobSetBuilder::new();

	for pattern in patterns {
		let glob = GlobBuilder::new(pattern)
			.literal_separator(true)
			.build()
			.map_err(|e| ExclusionError::InvalidPattern(format!("{}: {}", pattern, e)))?;
		builder.add(glob);
	}

	builder.build().map_err(|e| {
		ExclusionError::InvalidPattern(format!("Failed to build pattern set: {}", e))
	})
}
