//! triage - Eisenhower-matrix task triage board
//!
//! This library provides the core functionality for the triage CLI tool:
//! a single-user local task board with delta-synced import of ticket
//! candidates from an external source.
//!
//! # Core Concepts
//!
//! - **Board**: live tasks in five quadrants (uncategorized, q1-q4)
//! - **Archive**: immutable records of tasks moved off the board
//! - **Delta sync**: re-scan only a bounded window of the external source,
//!   with a safety-net minimum look-back
//! - **Duplicate resolution**: newest origin timestamp wins per ticket key
//! - **Q2 rewards**: completed important-not-urgent tasks earn milestones
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `triage.toml`
//! - `error`: Error types and result aliases
//! - `lock`: File locking and atomic writes for the store
//! - `output`: Shared CLI output formatting
//! - `scan`: Ticket-key extraction from subject/body text
//! - `stats`: Read-only board statistics
//! - `store`: Bucket persistence (tasks, archive, sync metadata, counter)
//! - `sync`: Sync window calculation, duplicate resolution, sources
//! - `task`: Task records and the board repository

pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod scan;
pub mod stats;
pub mod store;
pub mod sync;
pub mod task;

pub use error::{Error, Result};
