//! Utility modules for common functionality

pub mod signal;

pub use signal::{ShutdownListener, ShutdownSignal};

// vim: ts=4
