//! # Ollabridge Core
//!
//! Core translation pipeline for the ollabridge gateway.
//!
//! Clients speak the Ollama REST/NDJSON protocol to us; the actual
//! inference happens on an OpenAI-compatible upstream (OpenRouter by
//! default). The pipeline is:
//!
//! ```text
//! ollabridge-core/src/proxy/
//! ├── common/media_detect.rs   # base64 image signature → data URL
//! ├── mappers/messages.rs      # inbound messages → canonical content parts
//! ├── mappers/streaming.rs     # upstream SSE → Ollama NDJSON
//! ├── resolver.rs              # model alias → fully qualified upstream id
//! ├── upstream/client.rs       # OpenRouter chat/models calls
//! ├── handlers/                # /api/chat, /api/generate, /api/tags, ...
//! └── server.rs                # Axum router and server
//! ```

pub mod error;
pub mod proxy;

// Re-export commonly used types
pub use error::{AppError, AppResult};
