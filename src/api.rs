//! Wire-level clients for the remote services.

pub mod assistants;
pub mod ollama;
