//! Command-line interface definition for WebQA
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for asking questions, answering from supplied
//! context, and listing the available tools.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// WebQA - multi-tool question answering agent
///
/// Answers questions by reasoning step by step and calling a calculator,
/// date utilities, a clock, and web search along the way.
#[derive(Parser, Debug, Clone)]
#[command(name = "webqa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Override the language model
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Override the number of steps after which a final answer is demanded
    #[arg(long, global = true)]
    pub max_steps: Option<usize>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for WebQA
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Ask a question and let the agent reason with its tools
    Ask {
        /// The question to answer
        question: String,

        /// Show the reasoning steps after the answer
        #[arg(short, long)]
        steps: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,

        /// Suppress live progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Answer a question using only the text of a file
    Context {
        /// The question to answer
        question: String,

        /// File holding the context text
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List the tools available to the agent
    Tools {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            verbose: false,
            json_logs: false,
            model: None,
            max_steps: None,
            command: Commands::Tools { json: false },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Tools { json: false }));
    }

    #[test]
    fn test_cli_parse_ask() {
        let cli = Cli::try_parse_from(["webqa", "ask", "What is 15 * 23 + 47?"]).unwrap();
        match cli.command {
            Commands::Ask {
                question,
                steps,
                json,
                quiet,
            } => {
                assert_eq!(question, "What is 15 * 23 + 47?");
                assert!(!steps);
                assert!(!json);
                assert!(!quiet);
            }
            other => panic!("Expected Ask command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_ask_with_flags() {
        let cli = Cli::try_parse_from([
            "webqa",
            "--verbose",
            "--model",
            "claude-3-haiku-20240307",
            "ask",
            "--steps",
            "--json",
            "What time is it?",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.model.as_deref(), Some("claude-3-haiku-20240307"));
        if let Commands::Ask { steps, json, .. } = cli.command {
            assert!(steps);
            assert!(json);
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["webqa", "ask", "hi", "--max-steps", "4", "-c", "qa.yaml"])
                .unwrap();
        assert_eq!(cli.max_steps, Some(4));
        assert_eq!(cli.config.as_deref(), Some("qa.yaml"));
    }

    #[test]
    fn test_cli_parse_context() {
        let cli = Cli::try_parse_from([
            "webqa",
            "context",
            "Who founded it?",
            "--file",
            "article.txt",
        ])
        .unwrap();
        if let Commands::Context { question, file } = cli.command {
            assert_eq!(question, "Who founded it?");
            assert_eq!(file, PathBuf::from("article.txt"));
        } else {
            panic!("Expected Context command");
        }
    }

    #[test]
    fn test_cli_context_requires_file() {
        assert!(Cli::try_parse_from(["webqa", "context", "question"]).is_err());
    }

    #[test]
    fn test_cli_ask_requires_question() {
        assert!(Cli::try_parse_from(["webqa", "ask"]).is_err());
    }
}
