//! server-cli - address book and launcher for remote SSH servers
//!
//! This library exports the core modules for testing and potential reuse.

pub mod commands;
pub mod error;
pub mod logging;
pub mod models;
pub mod prompt;
pub mod resolver;
pub mod storage;
pub mod transport;

pub use error::{RecordError, ServerError};
