//! logrelay daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `logrelay-daemon` is used as a binary (main.rs).

pub mod app;
pub mod cli;
pub mod context_file;
pub mod health;
pub mod intake;
pub mod logging;
pub mod metrics_server;
pub mod relay;
