//! Agent core implementation of the reason/act loop
//!
//! A run alternates two phases until it stops:
//! - reason: ask the model what to do next, given the question and the
//!   steps so far
//! - act: run the chosen tool and record its observation as a step
//!
//! The run stops when the model answers, when it neither answers nor picks
//! a tool, when the model call fails, or when the phase budget is spent.

use crate::config::AgentConfig;
use crate::error::{Result, WebQaError};
use crate::prompts::{force_directive, render_reasoning_prompt};
use crate::providers::{CompletionRequest, Provider};
use crate::tools::ToolRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::guard::LoopGuard;
use super::parser::{parse_reply, ReplyAction};
use super::reporter::{ProgressReporter, SilentReporter};
use super::state::{AgentState, QaOutcome, Step};

/// Answer used when the run ends without one
pub const NO_ANSWER: &str = "Unable to generate an answer";

/// Answer used when the phase budget runs out
pub const TOO_MANY_STEPS_ANSWER: &str = "I apologize, but I wasn't able to complete the request as it required too many steps. Please try rephrasing your question or being more specific.";

/// Where the loop goes after a reasoning phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Act,
    End,
}

fn route_after_reasoning(state: &AgentState) -> Route {
    if state.final_answer.is_some() {
        Route::End
    } else if state.tool_name.is_some() {
        Route::Act
    } else {
        Route::End
    }
}

/// The question-answering agent
///
/// # Examples
///
/// ```ignore
/// use webqa::agent::Agent;
/// use webqa::config::{AgentConfig, Config};
/// use webqa::providers::create_provider;
/// use webqa::tools::build_default_registry;
///
/// # async fn example() -> webqa::error::Result<()> {
/// let config = Config::default();
/// let agent = Agent::new_boxed(
///     create_provider(&config)?,
///     build_default_registry(&config),
///     AgentConfig::default(),
/// )?;
/// let outcome = agent.run("What is 15 * 23 + 47?").await;
/// println!("{}", outcome.answer);
/// # Ok(())
/// # }
/// ```
pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    config: AgentConfig,
    guard: LoopGuard,
    reporter: Arc<dyn ProgressReporter>,
    max_tokens: u32,
    temperature: f32,
}

impl Agent {
    /// Creates a new agent instance
    ///
    /// # Arguments
    ///
    /// * `provider` - The language model used for reasoning
    /// * `tools` - The tools the model may call
    /// * `config` - Loop limits
    ///
    /// # Errors
    ///
    /// Returns `WebQaError::Config` if a limit is zero
    pub fn new(
        provider: impl Provider + 'static,
        tools: ToolRegistry,
        config: AgentConfig,
    ) -> Result<Self> {
        Self::with_provider(Arc::new(provider), tools, config)
    }

    /// Creates a new agent instance with a boxed provider
    ///
    /// # Errors
    ///
    /// Returns `WebQaError::Config` if a limit is zero
    pub fn new_boxed(
        provider: Box<dyn Provider>,
        tools: ToolRegistry,
        config: AgentConfig,
    ) -> Result<Self> {
        Self::with_provider(Arc::from(provider), tools, config)
    }

    fn with_provider(
        provider: Arc<dyn Provider>,
        tools: ToolRegistry,
        config: AgentConfig,
    ) -> Result<Self> {
        if config.recursion_limit == 0 {
            return Err(
                WebQaError::Config("recursion_limit must be greater than 0".to_string()).into(),
            );
        }
        if config.max_steps == 0 {
            return Err(WebQaError::Config("max_steps must be greater than 0".to_string()).into());
        }

        let guard = LoopGuard::new(config.max_steps, config.loop_window);
        Ok(Self {
            provider,
            tools,
            config,
            guard,
            reporter: Arc::new(SilentReporter),
            max_tokens: 500,
            temperature: 0.3,
        })
    }

    /// Report progress through the given reporter
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Sampling settings for reasoning calls
    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Answer a question
    ///
    /// Never fails: model errors and exhausted budgets are turned into an
    /// explanatory answer with `error` set.
    pub async fn run(&self, question: impl Into<String>) -> QaOutcome {
        let mut state = AgentState::new(question);
        info!("Starting run for question: {}", state.question);
        self.reporter
            .on_start(&state.question, &self.tools.list_tools());

        if let Err(e) = self.drive(&mut state).await {
            let message = e.to_string();
            state.final_answer = Some(match e.downcast_ref::<WebQaError>() {
                Some(WebQaError::RecursionLimit { .. }) => {
                    warn!("{}", message);
                    TOO_MANY_STEPS_ANSWER.to_string()
                }
                _ => {
                    warn!("Run failed: {}", message);
                    format!(
                        "I encountered an error while processing your request: {}",
                        message
                    )
                }
            });
            state.error = Some(message);
        }

        info!("Run finished after {} steps", state.steps.len());
        QaOutcome {
            question: state.question,
            answer: state
                .final_answer
                .unwrap_or_else(|| NO_ANSWER.to_string()),
            steps: state.steps,
            error: state.error,
        }
    }

    async fn drive(&self, state: &mut AgentState) -> Result<()> {
        let mut phases = 0;
        loop {
            self.count_phase(&mut phases)?;
            self.reason(state).await?;

            match route_after_reasoning(state) {
                Route::End => return Ok(()),
                Route::Act => {
                    self.count_phase(&mut phases)?;
                    self.act(state).await;
                }
            }
        }
    }

    fn count_phase(&self, phases: &mut usize) -> Result<()> {
        if *phases >= self.config.recursion_limit {
            return Err(WebQaError::RecursionLimit {
                limit: self.config.recursion_limit,
            }
            .into());
        }
        *phases += 1;
        debug!("Phase {}/{}", phases, self.config.recursion_limit);
        Ok(())
    }

    /// Reasoning phase: ask the model and record its decision
    async fn reason(&self, state: &mut AgentState) -> Result<()> {
        state.reset_decision();

        let mut context = state.render_context();
        if let Some(reason) = self.guard.check(&state.steps) {
            debug!("Demanding a final answer: {}", reason);
            self.reporter.on_force(reason);
            context.push_str(force_directive(reason));
        }

        let prompt = render_reasoning_prompt(&context, &self.tools.tools_description());
        let request = CompletionRequest::single(prompt, self.max_tokens, self.temperature);
        let response = self.provider.complete(&request).await?;
        debug!("Reasoning reply: {}", response.text);

        let reply = parse_reply(&response.text, &state.question);
        if let Some(thought) = &reply.thought {
            self.reporter.on_thought(thought);
        }
        state.thought = reply.thought;

        match reply.action {
            ReplyAction::UseTool { name, input } => {
                debug!("Model chose tool {} with input {}", name, input);
                state.tool_name = Some(name);
                state.tool_input = Some(input);
            }
            ReplyAction::FinalAnswer(answer) => {
                debug!("Model gave a final answer");
                state.final_answer = Some(answer);
            }
            ReplyAction::Nothing => {
                warn!("Reasoning reply had neither a tool call nor a final answer");
            }
        }
        Ok(())
    }

    /// Tool phase: run the chosen tool and record the step
    async fn act(&self, state: &mut AgentState) {
        let Some(tool_name) = state.tool_name.clone() else {
            state.error = Some("No tool selected".to_string());
            return;
        };
        let input = state
            .tool_input
            .clone()
            .unwrap_or_else(|| serde_json::json!({}));
        let input_text = input.to_string();

        let observation = match self.tools.get(&tool_name) {
            None => {
                let message = format!("Tool '{}' not found", tool_name);
                warn!("{}", message);
                self.reporter.on_tool_error(&message);
                state.error = Some(message.clone());
                format!(
                    "Error: {}. Available tools: {}",
                    message,
                    self.tools.names().join(", ")
                )
            }
            Some(tool) => {
                self.reporter.on_tool_call(&tool_name, &input);
                match tool.execute(input).await {
                    Ok(result) => {
                        let result = result.truncate_if_needed(self.config.max_output_size);
                        if result.truncated {
                            debug!(
                                "Tool output truncated to {} bytes",
                                self.config.max_output_size
                            );
                        }
                        let observation = result.to_message();
                        self.reporter.on_tool_output(&observation);
                        observation
                    }
                    Err(e) => {
                        let message = WebQaError::Tool(e.to_string()).to_string();
                        warn!("{}", message);
                        self.reporter.on_tool_error(&message);
                        state.error = Some(message.clone());
                        format!("Error: {}", message)
                    }
                }
            }
        };

        state.steps.push(Step {
            thought: state.thought.clone().unwrap_or_default(),
            tool: tool_name,
            tool_input: input_text,
            observation: observation.clone(),
        });
        state.observation = Some(observation);
    }
}
