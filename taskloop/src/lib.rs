//! Bounded-iteration task runner driving an external reasoning agent.
//!
//! This crate implements a document-driven execution model: a feature is
//! described by flat markdown documents (specification, task list,
//! acceptance criteria, history log), and each task runs as a loop that
//! repeatedly assembles a size-bounded context bundle, invokes an agent,
//! verifies the working tree, and appends an iteration record. The
//! architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (parsing, selection,
//!   budgeting). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (document reads, the history
//!   log, process execution, config). Isolated to enable scripted doubles
//!   in tests.
//!
//! Orchestration modules ([`bundle`], [`looping`], [`schedule`],
//! [`verify`]) coordinate core logic with I/O to implement CLI commands.

pub mod bundle;
pub mod core;
pub mod diag;
pub mod io;
pub mod logging;
pub mod looping;
pub mod prompt;
pub mod schedule;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod verify;
