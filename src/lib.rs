//! WebQA - multi-tool question answering agent library
//!
//! This library provides the core functionality for WebQA, an agent that
//! answers questions by alternating between model reasoning and tool calls.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `agent`: The reason/act loop, reply parsing, and the loop guard
//! - `answer`: Single-call answering from caller-supplied context
//! - `providers`: Language model abstraction and the Anthropic implementation
//! - `tools`: Calculator, clock, date arithmetic, web search, and the registry
//! - `prompts`: Prompt templates for reasoning and answering
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use webqa::providers::create_provider;
//! use webqa::tools::build_default_registry;
//! use webqa::{Agent, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let agent = Agent::new_boxed(
//!         create_provider(&config)?,
//!         build_default_registry(&config),
//!         config.agent.clone(),
//!     )?;
//!     let outcome = agent.run("How many days until December 25, 2025?").await;
//!     println!("{}", outcome.answer);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod answer;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod retry;
pub mod tools;

// Re-export commonly used types
pub use agent::{Agent, QaOutcome};
pub use config::Config;
pub use error::{Result, WebQaError};
