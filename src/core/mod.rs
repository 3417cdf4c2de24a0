pub mod config;
pub mod git;
pub mod gitlab;
pub mod trace;

pub use config::*;
pub use git::*;
pub use gitlab::*;
pub use trace::*;
