//! lola-chunk - Windowed text chunking
//!
//! This crate splits document text into overlapping fixed-size windows
//! for downstream embedding. Chunks keep enough overlap that semantic
//! context is not severed at a chunk boundary, while each chunk stays
//! bounded for embedding-model limits.
//!
//! # Example
//!
//! ```rust
//! use lola_chunk::chunk_text;
//! use lola_core::ChunkOptions;
//!
//! let chunks = chunk_text("Hello world", &ChunkOptions::default());
//! assert_eq!(chunks, vec!["Hello world"]);
//! ```

mod window;

pub use window::chunk_text;

// Re-export options for convenience
pub use lola_core::ChunkOptions;
