//! Upstream provider integration (OpenAI-compatible chat completion API).

pub mod client;

pub use client::UpstreamClient;
