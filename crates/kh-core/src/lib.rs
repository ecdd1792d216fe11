//! khawater/crates/kh-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Khawater:
//! the post model, the ports to remote and local storage, and the
//! repository that keeps them in sync.

pub mod content;
pub mod controller;
pub mod error;
pub mod models;
pub mod query;
pub mod repository;
pub mod seed;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-exporting for easier access in other crates
pub use controller::*;
pub use error::*;
pub use models::*;
pub use query::*;
pub use repository::*;
pub use traits::*;
