pub mod openrouter;
pub mod provider;
pub mod types;

pub use openrouter::OpenRouterProvider;
pub use provider::LlmProvider;
pub use types::{ChatMessage, ChatRequest};
