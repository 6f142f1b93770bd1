//! animeblog/crates/domains/src/lib.rs
//!
//! Domain model, port traits and mutation events shared by every layer of
//! the anime blog client. Nothing in here performs I/O.

pub mod error;
pub mod events;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use events::*;
pub use models::*;
pub use traits::*;
