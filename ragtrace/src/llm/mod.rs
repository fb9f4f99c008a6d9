mod api;
pub mod prompts;

pub use api::{CompletionOptions, LlmApiClient};
