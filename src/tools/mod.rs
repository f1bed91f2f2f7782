//! Tools module for WebQA
//!
//! This module contains the tool executor trait, the tool registry, and
//! the deterministic tools the agent can call: a calculator, a clock,
//! date arithmetic, and web search.

pub mod calculator;
pub mod clock;
pub mod date_calculator;
pub mod datetime;
pub mod registry_builder;
pub mod web_search;

pub use calculator::CalculatorTool;
pub use clock::{Clock, FixedClock, SystemClock};
pub use date_calculator::DateCalculatorTool;
pub use datetime::DateTimeTool;
pub use registry_builder::{build_default_registry, ToolRegistryBuilder};
pub use web_search::WebSearchTool;

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Tool result structure
///
/// Represents the result of a tool execution. Failures are still fed back
/// to the model as observations, rendered through [`ToolResult::to_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Whether the tool execution succeeded
    pub success: bool,
    /// Output from the tool
    pub output: String,
    /// Error message if execution failed
    pub error: Option<String>,
    /// Whether the output was truncated
    pub truncated: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            truncated: false,
        }
    }

    /// Create a failed tool result
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            truncated: false,
        }
    }

    /// Truncate output if it exceeds the maximum size
    ///
    /// The cut lands on a character boundary at or below `max_size` bytes.
    ///
    /// # Arguments
    ///
    /// * `max_size` - Maximum size in bytes
    pub fn truncate_if_needed(mut self, max_size: usize) -> Self {
        if self.output.len() > max_size {
            let mut cut = max_size;
            while !self.output.is_char_boundary(cut) {
                cut -= 1;
            }
            self.output.truncate(cut);
            self.output.push_str("\n... (truncated)");
            self.truncated = true;
        }
        self
    }

    /// Convert to the observation text shown to the model
    pub fn to_message(&self) -> String {
        if self.success {
            self.output.clone()
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("Unknown error")
            )
        }
    }
}

/// Tool executor trait for implementing tool execution logic
///
/// # Examples
///
/// ```
/// use webqa::tools::{ToolExecutor, ToolResult};
/// use webqa::error::Result;
/// use async_trait::async_trait;
/// use serde_json::Value;
///
/// struct Echo;
///
/// #[async_trait]
/// impl ToolExecutor for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn description(&self) -> &str {
///         "Repeats its input"
///     }
///
///     fn parameters(&self) -> Value {
///         serde_json::json!({"type": "object", "properties": {}})
///     }
///
///     async fn execute(&self, args: Value) -> Result<ToolResult> {
///         Ok(ToolResult::success(args.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Name the model uses to select this tool
    fn name(&self) -> &str;

    /// Description of what the tool does and when to use it
    fn description(&self) -> &str;

    /// JSON schema for the tool's arguments
    fn parameters(&self) -> serde_json::Value;

    /// Returns the tool definition as a JSON value
    fn tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "description": self.description(),
            "parameters": self.parameters(),
        })
    }

    /// Executes the tool with the given arguments
    ///
    /// # Errors
    ///
    /// Returns error only for failures outside the tool's own domain;
    /// expected failures come back as `ToolResult::error`
    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult>;
}

/// Name and description of a registered tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
}

/// Tool registry for managing available tools
///
/// Tools keep their registration order, which is the order they are
/// presented to the model. Registering a name twice replaces the earlier
/// tool in place.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool executor under its own name
    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) {
        match self
            .tools
            .iter()
            .position(|t| t.name() == executor.name())
        {
            Some(index) => self.tools[index] = executor,
            None => self.tools.push(executor),
        }
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Names of all registered tools
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Name and description of every registered tool
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Name, description and argument schema of every tool, in registration order
    pub fn all_definitions(&self) -> Vec<serde_json::Value> {
        self.tools.iter().map(|t| t.tool_definition()).collect()
    }

    /// Tool listing formatted for the reasoning prompt, one `- name: description` per line
    pub fn tools_description(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Read an optional string argument, treating JSON null as absent
pub(crate) fn string_arg<'a>(args: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}
