//! lola-core - Core types and traits for lola
//!
//! This crate provides the foundational types, traits, and error handling
//! used throughout the lola document-chat system.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{LolaError, Result};
pub use traits::*;
pub use types::*;
