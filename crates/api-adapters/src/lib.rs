//! animeblog/crates/api-adapters/src/lib.rs
//!
//! REST implementation of the `BlogApi` port.

pub mod envelope;
pub mod http;

pub use http::HttpBlogApi;
