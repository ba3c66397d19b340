//! LLM integration crate for Passage.
//!
//! Provider-agnostic abstraction for the language-model collaborator.
//! The interface is completion-only; generation failures surface as
//! `AppError::Generation` and are never retried here.
//!
//! # Providers
//! - **Ollama**: local LLM runtime (default)
//! - **OpenAI**: chat completions API (and compatible endpoints)
//!
//! # Example
//! ```no_run
//! use passage_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
