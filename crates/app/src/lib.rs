//! `jobwatch-app` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod command;
pub mod config;
pub mod dashboard;
pub mod session;
pub mod view;
