//! Request orchestration: configuration, per-request workspace and the `generate` entry point.

pub(crate) mod config;
pub(crate) mod generate;
pub(crate) mod workspace;
