/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `ask`     - Answer a question with the reasoning agent and its tools
- `context` - Answer a question from the text of a file
- `tools`   - List the tools the agent can call

The handlers only wire library components together: configuration,
provider, tool registry and agent.
*/

use crate::agent::{Agent, ConsoleReporter, ProgressReporter, QaOutcome, SilentReporter};
use crate::config::Config;
use crate::error::Result;
use crate::providers::create_provider;
use crate::tools::build_default_registry;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Characters of a step observation shown in the step listing
const STEP_OBSERVATION_CHARS: usize = 200;

fn rule() -> String {
    "-".repeat(50)
}

fn shorten(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// Ask command handler
pub mod ask {
    //! Reasoning agent handler.
    //!
    //! Builds the provider and tool registry, runs the agent on a single
    //! question and prints the outcome.

    use super::*;

    /// Answer a question with the reasoning agent
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `question` - The question to answer
    /// * `show_steps` - Print the tool steps after the answer
    /// * `json` - Print the outcome as JSON instead of text
    /// * `quiet` - Suppress live progress output
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot be created. Failures inside the
    /// run are part of the printed outcome, not errors.
    pub async fn run_ask(
        config: Config,
        question: String,
        show_steps: bool,
        json: bool,
        quiet: bool,
    ) -> Result<()> {
        let provider = create_provider(&config)?;
        let registry = build_default_registry(&config);
        tracing::info!("Registered {} tools", registry.len());

        let reporter: Arc<dyn ProgressReporter> = if quiet || json {
            Arc::new(SilentReporter)
        } else {
            Arc::new(ConsoleReporter)
        };

        let agent = Agent::new_boxed(provider, registry, config.agent.clone())?
            .with_reporter(reporter)
            .with_sampling(
                config.provider.reasoning_max_tokens,
                config.provider.reasoning_temperature,
            );

        let outcome = agent.run(question).await;

        if json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            print!("{}", render_outcome(&outcome, show_steps));
        }

        Ok(())
    }

    /// Render an outcome for the terminal
    pub fn render_outcome(outcome: &QaOutcome, show_steps: bool) -> String {
        let mut out = String::new();

        if show_steps && !outcome.steps.is_empty() {
            out.push_str(&format!("\n{}\n", "Reasoning steps:".bold()));
            out.push_str(&format!("{}\n", rule()));
            for (i, step) in outcome.steps.iter().enumerate() {
                out.push_str(&format!("\nStep {}:\n", i + 1));
                if !step.thought.is_empty() {
                    out.push_str(&format!("{} {}\n", "Thought:".yellow(), step.thought));
                }
                out.push_str(&format!("{} {}\n", "Tool:".green(), step.tool));
                out.push_str(&format!("Input: {}\n", step.tool_input));
                out.push_str(&format!(
                    "Observation: {}\n",
                    shorten(&step.observation, STEP_OBSERVATION_CHARS)
                ));
            }
            out.push_str(&format!("\n{}\n", rule()));
        }

        out.push_str(&format!("\n{}\n", "Answer:".green().bold()));
        out.push_str(&format!("{}\n", rule()));
        out.push_str(&format!("{}\n", outcome.answer));

        if let Some(error) = &outcome.error {
            out.push_str(&format!("\n{} {}\n", "Note:".yellow().bold(), error));
        }

        out
    }
}

// Context command handler
pub mod context {
    //! Context answering handler.

    use super::*;
    use crate::answer::{validate_response, ContextAnswerer};
    use anyhow::Context as _;

    /// Answer a question from the contents of a file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, the provider cannot be
    /// created or the model call fails
    pub async fn run_context(config: Config, question: String, file: PathBuf) -> Result<()> {
        let text = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read context file {}", file.display()))?;
        tracing::debug!("Loaded {} characters of context", text.chars().count());

        let provider = create_provider(&config)?;
        let answerer = ContextAnswerer::new(Arc::from(provider)).with_config(&config.provider);
        let response = answerer.answer(&question, &text).await?;

        if !validate_response(&response.answer) {
            tracing::warn!("Answer looks too short to be useful");
        }

        println!("\n{}", "Answer:".green().bold());
        println!("{}", rule());
        println!("{}", response.answer);
        println!();
        println!("Question type: {}", response.question_type);
        if let Some(usage) = response.usage {
            println!(
                "Tokens: {} in, {} out ({} total) [{}]",
                usage.input_tokens, usage.output_tokens, usage.total_tokens, response.model
            );
        }

        Ok(())
    }
}

// Tools command handler
pub mod tools {
    //! Tool listing handler.

    use super::*;

    /// Print the tools the agent would be given under this configuration
    ///
    /// The JSON listing carries each tool's argument schema.
    ///
    /// # Errors
    ///
    /// Returns error if JSON serialization fails
    pub fn run_tools(config: Config, json: bool) -> Result<()> {
        let registry = build_default_registry(&config);

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&registry.all_definitions())?
            );
            return Ok(());
        }

        println!("{}", "Available tools:".bold());
        for tool in registry.list_tools() {
            println!("- {}: {}", tool.name.cyan(), tool.description);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ask::render_outcome;
    use super::*;
    use crate::agent::Step;
    use crate::config::SearchConfig;

    fn outcome() -> QaOutcome {
        QaOutcome {
            question: "What is 15 * 23 + 47?".to_string(),
            answer: "15 * 23 + 47 = 392".to_string(),
            steps: vec![Step {
                thought: "I need to calculate".to_string(),
                tool: "calculator".to_string(),
                tool_input: r#"{"expression":"15 * 23 + 47"}"#.to_string(),
                observation: "Result: 392".to_string(),
            }],
            error: None,
        }
    }

    #[test]
    fn test_render_outcome_answer_only() {
        let text = render_outcome(&outcome(), false);
        assert!(text.contains("15 * 23 + 47 = 392"));
        assert!(!text.contains("Step 1:"));
        assert!(!text.contains("Note:"));
    }

    #[test]
    fn test_render_outcome_with_steps() {
        let text = render_outcome(&outcome(), true);
        assert!(text.contains("Step 1:"));
        assert!(text.contains("I need to calculate"));
        assert!(text.contains(r#"Input: {"expression":"15 * 23 + 47"}"#));
        assert!(text.contains("Observation: Result: 392"));
    }

    #[test]
    fn test_render_outcome_shortens_observations() {
        let mut outcome = outcome();
        outcome.steps[0].observation = "a".repeat(250);
        let text = render_outcome(&outcome, true);
        assert!(text.contains(&format!("Observation: {}...", "a".repeat(200))));
        assert!(!text.contains(&"a".repeat(201)));
    }

    #[test]
    fn test_render_outcome_with_error() {
        let mut outcome = outcome();
        outcome.error = Some("Tool 'weather' not found".to_string());
        let text = render_outcome(&outcome, false);
        assert!(text.contains("Tool 'weather' not found"));
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("abc", 5), "abc");
        assert_eq!(shorten("abcdef", 3), "abc...");
    }

    #[test]
    fn test_run_tools_without_search_credentials() {
        let config = Config {
            search: SearchConfig {
                api_key: None,
                engine_id: None,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(tools::run_tools(config, true).is_ok());
    }

    #[tokio::test]
    async fn test_run_context_missing_file() {
        let err = context::run_context(
            Config::default(),
            "What?".to_string(),
            PathBuf::from("/definitely/not/here.txt"),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read context file"));
    }
}
