//! taskboard - Task Query & Lifecycle Engine
//!
//! A task board whose records carry a status, a priority and an optional
//! due date. The engine validates payloads, builds list queries, runs the
//! task lifecycle against a pluggable repository and classifies tasks by
//! due-date urgency.
//!
//! # Module Organization
//!
//! - `task`: the task record, its enums and patch types
//! - `validate`: payload validation for create and update
//! - `query`: list parameter parsing, filtering, sorting and paging
//! - `urgency`: due-date classification and display views
//! - `service`: lifecycle operations over a repository
//! - `repository`: storage trait with in-memory and JSON file backends
//! - `lock`: file locking and atomic writes for the file backend
//! - `http`: axum binding
//! - `cli`: command-line interface using clap
//! - `config`: configuration loading from `taskboard.toml`
//! - `output`: JSON envelope and human output for CLI commands
//! - `error`: error types and result aliases

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod lock;
pub mod output;
pub mod query;
pub mod repository;
pub mod service;
pub mod task;
pub mod urgency;
pub mod validate;

pub use error::{Error, Result};
