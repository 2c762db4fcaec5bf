//! Injected diagnostics capability.
//!
//! Components deep inside the loop emit ad-hoc diagnostics through a
//! [`DiagSink`] handed to them explicitly rather than a process-wide
//! singleton. [`TracingSink`] forwards to the `tracing` stack;
//! [`NullSink`] is the legal "no diagnostics" configuration.

use tracing::{debug, error, info, warn};

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Diagnostics side channel for loop internals.
pub trait DiagSink: Send + Sync {
    fn emit(&self, level: DiagLevel, message: &str);
}

/// Forwards diagnostics to the `tracing` subscriber, if any is installed.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagSink for TracingSink {
    fn emit(&self, level: DiagLevel, message: &str) {
        match level {
            DiagLevel::Debug => debug!("{message}"),
            DiagLevel::Info => info!("{message}"),
            DiagLevel::Warn => warn!("{message}"),
            DiagLevel::Error => error!("{message}"),
        }
    }
}

/// Discards all diagnostics.
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagSink for NullSink {
    fn emit(&self, _level: DiagLevel, _message: &str) {}
}
