//! LLM wrapper for clinical intent tagging using llama.cpp.
//!
//! This crate provides optional LLM-assisted tagging of ophthalmic clinical
//! notes. The deterministic extractor in `lensrec-core` is always the source
//! of truth; output parsed here is advisory and goes through the same
//! review path as any other suggestion.

pub mod prompts;
pub mod extraction;

pub use extraction::*;
pub use prompts::*;
