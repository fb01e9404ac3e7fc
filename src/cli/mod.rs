//! CLI module for the datahub-mm binary

pub mod commands;
pub mod error;
pub mod output;

pub use error::CliError;
