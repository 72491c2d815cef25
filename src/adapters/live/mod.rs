//! Adapters that talk to real services.

pub mod gemini;
