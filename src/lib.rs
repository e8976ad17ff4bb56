//! Retrieval-augmented question answering over a recipe dataset.
//!
//! A question is matched against an in-memory TF-IDF index of the recipes,
//! the best matches are rendered into a grounding context, and a local
//! language model answers from that context only. When nothing matches,
//! the model is never called and a fixed fallback answer is returned.

pub mod config;
pub mod error;
pub mod index;
pub mod llm;
pub mod prompt;
pub mod rag;
pub mod record;
pub mod retriever;
pub mod utils;

pub use error::{GenerationError, MissingFieldError, RagError};
pub use rag::{Answer, Rag, Response};
