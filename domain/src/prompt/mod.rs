//! Prompt rendering for completion gateway adapters.

pub mod template;

pub use template::PromptTemplate;
