/// Error types shared by every operation.
pub mod error;

/// Exit status interpretation.
pub mod status;

/// Account records and host supplied values.
pub mod account;

/// Configuration serialization and deserialization.
pub mod config;

/// Script command line construction.
pub mod command;

/// Child process launching.
pub mod runner;

/// Bounded output collection.
pub mod collector;

/// Script output parsing.
pub mod parser;

/// Create, update, delete, search and test operations.
pub mod connector;

/// Utility functions for common operations.
pub mod utils;

/// CLI interface and commands.
pub mod cli;

pub use connector::{Connector, CreateOutcome, CreateRequest, UpdateRequest};
pub use error::{Error, Result};
