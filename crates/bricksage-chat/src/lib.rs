//! BrickSage Chat — hosted LLM integration.
//!
//! Builds the LEGO-expert prompt from retrieved context and sends it to an
//! external provider (OpenAI or Anthropic), either collecting a full
//! completion or streaming tokens for SSE.

pub mod config;
pub mod prompt;
pub mod providers;
pub mod types;

pub use config::LLMConfig;
pub use prompt::{build_messages, AssistantContext};
pub use types::*;
