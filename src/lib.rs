//! Codebox - compile and run user-submitted snippets behind an HTTP API.
//!
//! A submission gets its own workspace directory, is built with the
//! configured toolchain, run under a deadline, and reported as an
//! [`ExecutionResult`]. The workspace is removed afterwards in every case.

pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod http_server;
pub mod result;
pub mod runner;
pub mod state;
pub mod workspace;

pub use config::Config;
pub use error::{Error, Result};
pub use executor::Executor;
pub use result::ExecutionResult;
