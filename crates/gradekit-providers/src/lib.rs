//! gradekit-providers: semantic judge integrations.
//!
//! Implements the `SemanticJudge` trait for Anthropic and OpenAI-compatible
//! APIs, plus a scripted mock, and loads the TOML configuration that decides
//! which judge the enhanced backend uses.

pub mod anthropic;
pub mod config;
pub mod error;
pub mod mock;
pub mod openai;

pub use config::{build_selector, create_judge, load_config, GradekitConfig, JudgeConfig};
pub use error::ProviderError;
