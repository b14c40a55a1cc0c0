//! Shared helpers for the translation pipeline.

pub mod media_detect;
