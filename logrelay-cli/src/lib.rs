//! logrelay CLI
//!
//! Operator tooling for the pattern catalog stored in Redis and for the
//! `logrelay.toml` configuration file. The binary lives in `main.rs`; the
//! handlers are exposed here so integration tests can drive them directly.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
