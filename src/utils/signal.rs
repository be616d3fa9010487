//! Signal handling for graceful termination

use std::io;
use tracing::debug;

/// Which signal asked us to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
	Interrupt,
	Terminate,
}

/// Installed SIGINT/SIGTERM handlers
///
/// Handlers are registered by [`ShutdownListener::install`], so a signal that
/// arrives before [`ShutdownListener::recv`] is first polled is not lost.
pub struct ShutdownListener {
	#[cfg(unix)]
	sigint: tokio::signal::unix::Signal,
	#[cfg(unix)]
	sigterm: tokio::signal::unix::Signal,
}

impl ShutdownListener {
	#[cfg(unix)]
	pub fn install() -> io::Result<Self> {
		use tokio::signal::unix::{signal, SignalKind};

		let sigint = signal(SignalKind::interrupt())?;
		let sigterm = signal(SignalKind::terminate())?;
		Ok(ShutdownListener { sigint, sigterm })
	}

	#[cfg(not(unix))]
	pub fn install() -> io::Result<Self> {
		Ok(ShutdownListener {})
	}

	/// Wait for the next shutdown request
	#[cfg(unix)]
	pub async fn recv(&mut self) -> ShutdownSignal {
		tokio::select! {
			_ = self.sigterm.recv() => {
				debug!("Received SIGTERM, shutting down...");
				ShutdownSignal::Terminate
			}
			_ = self.sigint.recv() => {
				debug!("Received SIGINT, shutting down...");
				ShutdownSignal::Interrupt
			}
		}
	}

	#[cfg(not(unix))]
	pub async fn recv(&mut self) -> ShutdownSignal {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::warn!("Failed to listen for Ctrl-C: {}", e);
			std::future::pending::<()>().await;
		}
		debug!("Received Ctrl-C, shutting down...");
		ShutdownSignal::Interrupt
	}
}

// vim: ts=4
