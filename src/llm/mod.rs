pub mod client;

pub use client::types::{CompletionOptions, ProviderError};
pub use client::{LLMClient, TextCompletionProvider};
