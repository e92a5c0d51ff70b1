//! Attachment migrator
//!
//! Copies attachments from issues on a source Jira instance onto the
//! records of a target instance that reference them, either Jira issues or
//! TM4J test cases.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Settings file, environment overrides and validation
//! - [`source`] - Source Jira client and attachment staging contract
//! - [`target`] - Target providers and the paginated record cursor
//! - [`transfer`] - The per-record migration engine
//! - [`staging`] - Local attachment staging area
//! - [`key`] - External key extraction and numeric key parsing
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod key;
pub mod model;
pub mod source;
pub mod staging;
pub mod target;
pub mod transfer;

#[cfg(test)]
pub mod test_support;

pub use error::{Error, Result};
