//! # cbot-cli
//!
//! Argument parsing and env config loading for the `cbot` binary.

pub mod cli;

pub use cli::{AppConfig, Cli, Commands};
