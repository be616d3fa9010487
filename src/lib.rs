//! # autopush - publish every file change to a remote repository
//!
//! autopush polls a working tree, fingerprints every file with BLAKE3 and
//! turns each detected creation, modification or deletion into a
//! stage -> commit -> push sequence against the repository's version-control
//! tool. Sequences never overlap.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use autopush::{Config, ChangeNotifier, GitCli, ScanLoop, SyncDispatcher};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     let root = std::fs::canonicalize(&config.root).unwrap();
//!     let vcs = Arc::new(GitCli::new(&root, &config));
//!     let dispatcher = Arc::new(SyncDispatcher::new(&root, vcs));
//!     let mut scan = ScanLoop::new(&root, &config, dispatcher, ChangeNotifier::new());
//!     scan.establish_baseline().await;
//!     let changes = scan.scan_once().await;
//!     println!("{} change(s) published", changes.len());
//! }
//! ```

pub mod config;
pub mod diff;
pub mod dispatch;
pub mod error;
pub mod exclusion;
pub mod logging;
pub mod scan;
pub mod snapshot;
pub mod utils;
pub mod vcs;

// Re-export commonly used types and functions
pub use config::Config;
pub use diff::{diff, DiffResult};
pub use dispatch::{DispatchOutcome, SyncAction, SyncDispatcher};
pub use error::{AutopushError, VcsError, VcsStep};
pub use exclusion::IgnoreRuleSet;
pub use scan::{ChangeNotifier, ScanLoop};
pub use snapshot::{Fingerprint, ScanOptions, Snapshot};
pub use vcs::{CommitOutcome, GitCli, VcsCollaborator};

// vim: ts=4
