//! bookrank: host package for the book-retrieval rank-fusion engine.
//!
//! The engine itself lives in [`bookrank_fusion`]. This crate adds the
//! pieces a process needs around it: TOML configuration, a host error
//! type, and JSON envelopes for running fusion over pre-retrieved
//! channel lists.

pub mod config;
pub mod error;
pub mod request;

pub use bookrank_fusion as fusion;
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use request::{run_fuse_request, ChannelInput, FuseRequest, FuseResponse};
