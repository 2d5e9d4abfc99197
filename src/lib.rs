//! Device Grant - OAuth 2.0 Device Authorization Grant (RFC 8628)
//!
//! A stateless device flow engine: every replica works against the same
//! database and all race-sensitive transitions are conditional writes.

pub mod codes;
pub mod device;
pub mod entities;
pub mod errors;
pub mod jobs;
pub mod protocol;
pub mod settings;
pub mod storage;
