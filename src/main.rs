use clap::{Arg, ArgMatches, Command};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;

use autopush::config::Config;
use autopush::error::AutopushError;
use autopush::logging::*;
use autopush::scan::{ChangeNotifier, ScanLoop};
use autopush::utils::ShutdownListener;
use autopush::vcs::{self, GitCli};
use autopush::SyncDispatcher;

fn cli() -> Command {
	Command::new("autopush")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Commit and push every file change in a repository as it happens")
		.arg(Arg::new("root").value_name("ROOT").help("Directory to watch [default: .]"))
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.help("Config file (TOML, or JSON with a .json extension)"),
		)
		.arg(
			Arg::new("interval")
				.short('i')
				.long("interval")
				.value_name("DURATION")
				.help("Poll period, e.g. 1s, 500ms"),
		)
		.arg(
			Arg::new("metadata-dir")
				.long("metadata-dir")
				.value_name("NAME")
				.help("Version-control metadata directory [default: .git]"),
		)
		.arg(
			Arg::new("ignore-file")
				.long("ignore-file")
				.value_name("NAME")
				.help("Per-directory ignore-rule file [default: .gitignore]"),
		)
		.arg(Arg::new("remote").short('r').long("remote").value_name("NAME").help("Remote to push to"))
		.arg(Arg::new("branch").short('b').long("branch").value_name("NAME").help("Branch to push"))
		.arg(Arg::new("git").long("git").value_name("PROGRAM").help("Version-control program to run"))
		.arg(
			Arg::new("skip-existing")
				.long("skip-existing")
				.action(clap::ArgAction::SetTrue)
				.help("Treat files that already exist at startup as synced"),
		)
		.arg(
			Arg::new("log-level")
				.long("log-level")
				.value_name("LEVEL")
				.help("Log level when RUST_LOG is unset [default: info]"),
		)
}

/// Defaults, then config file, then environment, then flags
fn load_config(matches: &ArgMatches) -> Result<Config, AutopushError> {
	let cli_root = matches.get_one::<String>("root").map(PathBuf::from);
	let lookup_root = cli_root.clone().unwrap_or_else(|| PathBuf::from("."));
	let config_path = matches.get_one::<String>("config").map(PathBuf::from);

	let mut config = Config::discover(&lookup_root, config_path.as_deref())?;
	config.apply_env();

	if let Some(root) = cli_root {
		config.root = root;
	}
	let string_flags: [(&str, &mut String); 5] = [
		("interval", &mut config.interval),
		("metadata-dir", &mut config.vcs_metadata_dir_name),
		("ignore-file", &mut config.ignore_file_name),
		("git", &mut config.vcs_program),
		("log-level", &mut config.log_level),
	];
	for (name, field) in string_flags {
		if let Some(value) = matches.get_one::<String>(name) {
			*field = value.clone();
		}
	}
	if let Some(remote) = matches.get_one::<String>("remote") {
		config.remote = Some(remote.clone());
	}
	if let Some(branch) = matches.get_one::<String>("branch") {
		config.branch = Some(branch.clone());
	}
	if matches.get_flag("skip-existing") {
		config.skip_existing_on_start = true;
	}

	config.validate()?;
	Ok(config)
}

/// Resolve the watch root and make sure it is a repository
fn resolve_root(config: &Config) -> Result<PathBuf, AutopushError> {
	let root = fs::canonicalize(&config.root)
		.map_err(|_| AutopushError::NotARepository { path: config.root.clone() })?;

	if !vcs::is_repository(&root, &config.vcs_metadata_dir_name) {
		return Err(AutopushError::NotARepository { path: root });
	}
	Ok(root)
}

async fn run(config: Config, root: &Path) -> Result<(), AutopushError> {
	let mut shutdown_signal = ShutdownListener::install()?;

	let vcs = Arc::new(GitCli::new(root, &config));
	let dispatcher = Arc::new(SyncDispatcher::new(root, vcs));
	let notifier = ChangeNotifier::new();
	let mut changes = notifier.subscribe();

	let mut scan_loop = ScanLoop::new(root, &config, dispatcher, notifier);
	scan_loop.establish_baseline().await;

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let scan_task = tokio::spawn(scan_loop.run(shutdown_rx));

	println!("Watching {} for changes...", root.display());

	let signal = loop {
		tokio::select! {
			signal = shutdown_signal.recv() => break signal,
			changed = changes.changed() => {
				if changed.is_err() {
					break shutdown_signal.recv().await;
				}
				debug!("Change cycle {} synced", *changes.borrow());
			}
		}
	};

	info!("{:?} received, waiting for in-flight syncs", signal);
	let _ = shutdown_tx.send(true);
	if let Err(e) = scan_task.await {
		error!("Scan loop ended abnormally: {}", e);
	}

	println!("Goodbye!");
	Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
	let matches = cli().get_matches();

	let config = match load_config(&matches) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("{}", e);
			return ExitCode::FAILURE;
		}
	};

	init_tracing(&config.log_level);

	let root = match resolve_root(&config) {
		Ok(root) => root,
		Err(e) => {
			eprintln!("{}", e);
			return ExitCode::FAILURE;
		}
	};

	match run(config, &root).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{}", e);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
