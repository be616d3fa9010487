//! Configuration for autopush
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (`--config <FILE>` or `<root>/.autopush.toml`)
//! 3. Environment variables (AUTOPUSH_* prefix)
//! 4. CLI flags (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AutopushError;

/// Config file looked up in the watch root when none is given explicitly
pub const DEFAULT_CONFIG_FILE: &str = ".autopush.toml";

/// Configuration for a watch session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	// ========================================================================
	// WATCHING
	// ========================================================================
	/// Directory to watch (must be a repository root)
	pub root: PathBuf,

	/// Poll period between scans (e.g. "1s", "500ms", "2m")
	pub interval: String,

	/// Treat files that already exist at startup as synced instead of pushing them
	pub skip_existing_on_start: bool,

	// ========================================================================
	// EXCLUSION
	// ========================================================================
	/// Metadata directory of the version-control tool, never scanned
	pub vcs_metadata_dir_name: String,

	/// Per-directory ignore-rule file name
	pub ignore_file_name: String,

	// ========================================================================
	// VERSION CONTROL
	// ========================================================================
	/// Version-control program to run
	pub vcs_program: String,

	/// Remote to push to (tool default if unset)
	pub remote: Option<String>,

	/// Branch to push (requires `remote`)
	pub branch: Option<String>,

	/// Maximum wait for the tool's own index lock before a stage fails
	pub lock_wait: String,

	// ========================================================================
	// OUTPUT & LOGGING
	// ========================================================================
	/// Default log filter when RUST_LOG is not set
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			root: PathBuf::from("."),
			interval: "1s".to_string(),
			skip_existing_on_start: false,
			vcs_metadata_dir_name: ".git".to_string(),
			ignore_file_name: ".gitignore".to_string(),
			vcs_program: "git".to_string(),
			remote: None,
			branch: None,
			lock_wait: "5s".to_string(),
			log_level: "info".to_string(),
		}
	}
}

impl Config {
	/// Load a config file; `.json` files are parsed as JSON, anything else as TOML
	pub fn from_file(path: &Path) -> Result<Self, AutopushError> {
		let contents = fs::read_to_string(path).map_err(|e| AutopushError::InvalidConfig {
			message: format!("cannot read {}: {}", path.display(), e),
		})?;

		let is_json = path.extension().map_or(false, |ext| ext == "json");
		let parsed: Result<Config, String> = if is_json {
			serde_json::from_str(&contents).map_err(|e| e.to_string())
		} else {
			toml::from_str(&contents).map_err(|e| e.to_string())
		};

		parsed.map_err(|message| AutopushError::InvalidConfig {
			message: format!("{}: {}", path.display(), message),
		})
	}

	/// Load `path` if given, else `<root>/.autopush.toml` if it exists, else defaults
	pub fn discover(root: &Path, path: Option<&Path>) -> Result<Self, AutopushError> {
		match path {
			Some(path) => Self::from_file(path),
			None => {
				let candidate = root.join(DEFAULT_CONFIG_FILE);
				if candidate.is_file() {
					Self::from_file(&candidate)
				} else {
					Ok(Self::default())
				}
			}
		}
	}

	/// Apply AUTOPUSH_* variables from the process environment
	pub fn apply_env(&mut self) {
		self.apply_env_from(|key| std::env::var(key).ok());
	}

	/// Apply AUTOPUSH_* variables using `lookup` to read them
	pub fn apply_env_from<F>(&mut self, lookup: F)
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(v) = lookup("AUTOPUSH_INTERVAL") {
			self.interval = v;
		}
		if let Some(v) = lookup("AUTOPUSH_REMOTE") {
			self.remote = Some(v);
		}
		if let Some(v) = lookup("AUTOPUSH_BRANCH") {
			self.branch = Some(v);
		}
		if let Some(v) = lookup("AUTOPUSH_GIT") {
			self.vcs_program = v;
		}
		if let Some(v) = lookup("AUTOPUSH_IGNORE_FILE") {
			self.ignore_file_name = v;
		}
		if let Some(v) = lookup("AUTOPUSH_METADATA_DIR") {
			self.vcs_metadata_dir_name = v;
		}
	}

	/// Check the configuration for values the engine cannot work with
	pub fn validate(&self) -> Result<(), AutopushError> {
		let interval = parse_duration(&self.interval)?;
		if interval.is_zero() {
			return Err(invalid("interval must be greater than 0"));
		}
		parse_duration(&self.lock_wait)?;

		if self.vcs_metadata_dir_name.trim().is_empty() {
			return Err(invalid("vcsMetadataDirName must not be empty"));
		}
		if self.ignore_file_name.trim().is_empty() {
			return Err(invalid("ignoreFileName must not be empty"));
		}
		if self.vcs_program.trim().is_empty() {
			return Err(invalid("vcsProgram must not be empty"));
		}
		if self.branch.is_some() && self.remote.is_none() {
			return Err(invalid("branch requires remote to be set"));
		}
		Ok(())
	}

	/// Poll period; falls back to one second if the value does not parse
	pub fn interval_duration(&self) -> Duration {
		parse_duration(&self.interval).unwrap_or_else(|_| Duration::from_secs(1))
	}

	/// Index lock wait; falls back to five seconds if the value does not parse
	pub fn lock_wait_duration(&self) -> Duration {
		parse_duration(&self.lock_wait).unwrap_or_else(|_| Duration::from_secs(5))
	}
}

fn invalid(message: &str) -> AutopushError {
	AutopushError::InvalidConfig { message: message.to_string() }
}

/// Parse a duration such as "500ms", "2s", "1m" or "1h"
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, AutopushError> {
	let s = s.trim().to_lowercase();

	let (num_str, millis_per_unit): (&str, u64) = if let Some(n) = s.strip_suffix("ms") {
		(n, 1)
	} else if let Some(n) = s.strip_suffix('h') {
		(n, 60 * 60 * 1000)
	} else if let Some(n) = s.strip_suffix('m') {
		(n, 60 * 1000)
	} else if let Some(n) = s.strip_suffix('s') {
		(n, 1000)
	} else {
		(s.as_str(), 1000)
	};

	let num: u64 = num_str
		.trim()
		.parse()
		.map_err(|_| AutopushError::InvalidConfig { message: format!("Invalid duration: {}", s) })?;

	let millis = num.checked_mul(millis_per_unit).ok_or_else(|| AutopushError::InvalidConfig {
		message: format!("Duration out of range: {}", s),
	})?;

	Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn test_config_default() {
		let config = Config::default();
		assert_eq!(config.root, PathBuf::from("."));
		assert_eq!(config.interval_duration(), Duration::from_secs(1));
		assert_eq!(config.vcs_metadata_dir_name, ".git");
		assert_eq!(config.ignore_file_name, ".gitignore");
		assert!(config.remote.is_none());
		// the first cycle compares against an empty baseline
		assert!(!config.skip_existing_on_start);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_parse_duration() {
		assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
		assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
		assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
		assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
		assert_eq!(parse_duration(" 1H ").unwrap(), Duration::from_secs(3600));
		assert!(parse_duration("soon").is_err());
		assert!(parse_duration("-1s").is_err());

		let err = parse_duration("18446744073709551615h").unwrap_err();
		assert!(err.to_string().contains("out of range"));
		assert!(parse_duration("18446744073709551615ms").is_ok());
	}

	#[test]
	fn test_validate_rejects_overflowing_interval() {
		let huge = Config { interval: "18446744073709551615h".to_string(), ..Config::default() };
		assert!(huge.validate().is_err());
	}

	#[test]
	fn test_env_overrides() {
		let vars: HashMap<&str, &str> =
			[("AUTOPUSH_INTERVAL", "250ms"), ("AUTOPUSH_REMOTE", "backup")].iter().cloned().collect();

		let mut config = Config::default();
		config.apply_env_from(|key| vars.get(key).map(|v| v.to_string()));

		assert_eq!(config.interval_duration(), Duration::from_millis(250));
		assert_eq!(config.remote.as_deref(), Some("backup"));
		assert_eq!(config.vcs_program, "git");
	}

	#[test]
	fn test_validate_rejects_bad_values() {
		let zero = Config { interval: "0s".to_string(), ..Config::default() };
		assert!(zero.validate().is_err());

		let branch_only = Config { branch: Some("main".to_string()), ..Config::default() };
		let err = branch_only.validate().unwrap_err();
		assert!(err.to_string().contains("branch requires remote"));

		let unnamed = Config { ignore_file_name: " ".to_string(), ..Config::default() };
		assert!(unnamed.validate().is_err());
	}

	#[test]
	fn test_config_serialization() {
		let config = Config { remote: Some("origin".to_string()), ..Config::default() };
		let json = serde_json::to_string(&config).expect("Failed to serialize");
		assert!(json.contains("\"vcsMetadataDirName\""));
		let deserialized: Config = serde_json::from_str(&json).expect("Failed to deserialize");
		assert_eq!(config, deserialized);
	}
}

// vim: ts=4
