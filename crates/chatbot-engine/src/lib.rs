//! chatbot-engine: Headless conversation engine for the chatbot client
//!
//! This crate provides everything below the terminal UI:
//! - Message and transcript types
//! - The conversation controller (optimistic send, clear, restore)
//! - Reply normalization over the possible result shapes
//! - The Gemini generation client
//! - Session-scoped transcript storage
//! - Configuration

pub mod client;
pub mod config;
pub mod controller;
pub mod message;
pub mod normalize;
pub mod response;
pub mod session;

// Re-export commonly used types
pub use client::{connect, ClientError, GeminiClient, GenerateError, TextGenerator};
pub use config::{Config, ConfigError, Paths};
pub use controller::{
    BotReply, Controller, PendingSend, SendOutcome, DEFAULT_STORAGE_KEY, MODEL_UNAVAILABLE,
    SEND_FAILED,
};
pub use message::{Message, Role, Transcript};
pub use normalize::{normalize, FALLBACK_MAX_CHARS, NO_RESPONSE};
pub use response::{DeferredText, GenerateResult, ResponseObject, ResponseShape, ResultObject, TextField};
pub use session::{FileSessionStore, MemorySessionStore, SessionError, SessionStore};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
