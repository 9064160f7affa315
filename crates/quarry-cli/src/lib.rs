//! # quarry-cli
//!
//! Command-line front end for Quarry search backends:
//! - `update-index`: rebuild a backend's index from the record store
//! - `search`: query one record type with optional filters
//! - `backends`: list configured and built-in backends
//! - `config`: inspect or create the TOML configuration

#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;

pub use config::QuarryConfig;
