//! Side-effecting adapters: filesystem, process execution, configuration.

pub mod agent;
pub mod config;
pub mod docs;
pub mod process;
pub mod progress;
