//! Completion and embedding providers for Skycast.
//!
//! All providers implement the `skycast_core::Provider` trait. The CLI builds
//! one from the `[provider]` config section and shares it for the process
//! lifetime.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
