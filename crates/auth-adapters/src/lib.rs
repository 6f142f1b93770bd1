//! animeblog/crates/auth-adapters/src/lib.rs
//!
//! Session token adapters: client-side JWT decoding and token persistence.

pub mod error;
pub mod jwt;
pub mod storage;

pub use error::TokenError;
pub use jwt::JwtTokenDecoder;
pub use storage::{FileTokenStorage, MemoryTokenStorage};
