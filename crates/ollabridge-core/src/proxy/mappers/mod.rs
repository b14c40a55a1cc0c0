//! Protocol mappers: inbound Ollama shapes → canonical upstream messages,
//! and upstream responses → Ollama envelopes (single JSON or NDJSON).

pub mod messages;
pub mod models;
pub mod streaming;

pub use messages::normalize_messages;
pub use streaming::{ndjson_stream, EnvelopeFlavor};
