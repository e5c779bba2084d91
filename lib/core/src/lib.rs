//! Core types and utilities for the hirepath services.
//!
//! This crate provides the `Result` alias shared by the platform-access
//! library and the server, and the request id used to correlate logs.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::RequestId;
