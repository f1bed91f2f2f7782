//! Progress reporting for the reason/act loop
//!
//! The loop itself only logs through `tracing`; what the user sees while a
//! question is being worked on goes through a [`ProgressReporter`].

use colored::Colorize;

use super::guard::ForceReason;
use crate::tools::ToolInfo;

/// Lines of multi-line tool output shown by the console reporter
const OUTPUT_PREVIEW_LINES: usize = 5;

/// Characters of single-line tool output shown by the console reporter
const OUTPUT_PREVIEW_CHARS: usize = 100;

/// Receives progress events from the agent
pub trait ProgressReporter: Send + Sync {
    /// A run is starting
    fn on_start(&self, _question: &str, _tools: &[ToolInfo]) {}

    /// The model produced a thought
    fn on_thought(&self, _thought: &str) {}

    /// A final answer is about to be demanded
    fn on_force(&self, _reason: ForceReason) {}

    /// A tool is about to run
    fn on_tool_call(&self, _tool: &str, _input: &serde_json::Value) {}

    /// A tool produced an observation
    fn on_tool_output(&self, _observation: &str) {}

    /// A tool call could not be carried out
    fn on_tool_error(&self, _message: &str) {}
}

/// Reporter that shows nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Reporter that prints coloured progress to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

fn rule() -> String {
    "=".repeat(60)
}

fn shorten(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Render tool output the way the console shows it
///
/// Multi-line output shows its first non-blank lines with a count of the
/// rest; a single line is cut at a fixed width.
pub fn preview_output(observation: &str) -> Vec<String> {
    let lines: Vec<&str> = observation.split('\n').collect();
    if lines.len() == 1 {
        return vec![format!(
            "Output: {}",
            shorten(observation, OUTPUT_PREVIEW_CHARS)
        )];
    }

    let mut preview = vec!["Output:".to_string()];
    preview.extend(
        lines
            .iter()
            .take(OUTPUT_PREVIEW_LINES)
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("  {}", line)),
    );
    if lines.len() > OUTPUT_PREVIEW_LINES {
        preview.push(format!(
            "  ... ({} more lines)",
            lines.len() - OUTPUT_PREVIEW_LINES
        ));
    }
    preview
}

impl ProgressReporter for ConsoleReporter {
    fn on_start(&self, question: &str, tools: &[ToolInfo]) {
        println!("\n{}", rule());
        println!("{}", "STARTING REASONING".bold());
        println!("{}", rule());
        println!("\nQuestion: {}", question.cyan());
        println!("\nAvailable tools:");
        for tool in tools {
            println!("  - {}: {}", tool.name.bold(), shorten(&tool.description, 60));
        }
    }

    fn on_thought(&self, thought: &str) {
        let first_line = thought.lines().next().unwrap_or_default().trim();
        println!("\n{} {}", "Thought:".yellow(), first_line);
    }

    fn on_force(&self, reason: ForceReason) {
        let note = match reason {
            ForceReason::CompleteAnswer => "Previous tool provided complete answer",
            ForceReason::LoopDetected => "Detected repeated tool usage pattern",
            ForceReason::MaxSteps => "Maximum steps reached",
        };
        println!("\n{}", note.magenta());
    }

    fn on_tool_call(&self, tool: &str, input: &serde_json::Value) {
        println!("\n{} {}", "Tool:".green().bold(), tool);
        println!("   Input: {}", input);
    }

    fn on_tool_output(&self, observation: &str) {
        for line in preview_output(observation) {
            println!("   {}", line);
        }
    }

    fn on_tool_error(&self, message: &str) {
        println!("\n{} {}", "Tool error:".red().bold(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_single_line() {
        assert_eq!(preview_output("Result: 392"), vec!["Output: Result: 392"]);
        let long = "x".repeat(150);
        assert_eq!(
            preview_output(&long),
            vec![format!("Output: {}...", "x".repeat(100))]
        );
    }

    #[test]
    fn test_preview_multi_line() {
        let observation = "a\nb\n\nc\nd\ne\nf";
        assert_eq!(
            preview_output(observation),
            vec!["Output:", "  a", "  b", "  c", "  d", "  ... (2 more lines)"]
        );
    }

    #[test]
    fn test_silent_reporter_accepts_events() {
        let reporter = SilentReporter;
        reporter.on_start("q", &[]);
        reporter.on_thought("t");
        reporter.on_force(ForceReason::MaxSteps);
        reporter.on_tool_call("calculator", &serde_json::json!({}));
        reporter.on_tool_output("o");
        reporter.on_tool_error("e");
    }
}
