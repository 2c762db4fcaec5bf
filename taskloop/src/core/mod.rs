//! Pure, deterministic logic: size estimation, document parsing, selection.
//!
//! Nothing in this module performs I/O. Orchestration modules feed it
//! document text read from the document root and consume typed records.

pub mod budget;
pub mod history;
pub mod sections;
pub mod tasks;
pub mod types;
