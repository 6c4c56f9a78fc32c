//! forgesync core library.
//!
//! Foundational components for mirroring repositories between a self-hosted
//! Gitea instance and GitHub: typed configuration, host API clients, the git
//! CLI wrapper, and the pair-by-pair sync engine.

pub mod config;
pub mod engine;
pub mod errors;
pub mod git;
pub mod hosts;
pub mod process;

// Re-exports for convenience.
pub use config::{RepoPair, SyncConfig, SyncDirection};
pub use engine::{PairStatus, RunReport, SyncEngine};
pub use hosts::HttpResolver;
pub use process::SystemRunner;
