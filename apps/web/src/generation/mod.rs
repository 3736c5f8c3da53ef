// Document generation: form validation, prompt building, model call, persistence.
// All model calls go through llm_client::TextGenerator.

pub mod generator;
pub mod handlers;
pub mod prompts;
