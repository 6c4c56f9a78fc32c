//! Git plumbing: CLI wrapper and remote URL helpers.

pub mod cli;
pub mod remote_url;

pub use cli::GitCli;
