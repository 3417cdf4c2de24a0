//! lab - GitLab CI helpers for the command line
//!
//! `lab ci trace` finds a CI job for a branch and streams its log to the
//! terminal, polling until the job finishes.
//!
//! # Architecture
//!
//! - **commands**: CLI command implementations (ci trace)
//! - **core**: git wrapper, GitLab client, trace streamer, config loading
//! - **models**: Data structures (config, job, project)
//! - **error**: Error types

pub mod commands;
pub mod core;
pub mod error;
pub mod models;

pub use error::{LabError, Result};
