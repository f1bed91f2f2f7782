//! Parsing of the model's reasoning replies
//!
//! Replies use the markers `THOUGHT:`, `TOOL:`, `INPUT:`, and
//! `FINAL ANSWER:`. A tool call wins over a final answer unless the final
//! answer appears first.

use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

const THOUGHT: &str = "THOUGHT:";
const TOOL: &str = "TOOL:";
const INPUT: &str = "INPUT:";
const FINAL_ANSWER: &str = "FINAL ANSWER:";

/// What the model decided to do
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyAction {
    /// Call a tool with parsed arguments
    UseTool {
        /// Tool name as written by the model
        name: String,
        /// Arguments for the tool
        input: Value,
    },
    /// Stop with an answer
    FinalAnswer(String),
    /// Neither a usable tool call nor an answer
    Nothing,
}

/// A parsed reasoning reply
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    /// Reasoning text, if the reply had a `THOUGHT:` section
    pub thought: Option<String>,
    /// The decision
    pub action: ReplyAction,
}

fn query_wrapper() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{['"]query['"]:\s*['"](.+?)['"]\}"#).expect("query regex is valid")
    })
}

fn target_date_wrapper() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{['"]target_date['"]:\s*['"](.+?)['"]\}"#)
            .expect("target_date regex is valid")
    })
}

fn signed_integer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+$").expect("integer regex is valid"))
}

fn first_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("number regex is valid"))
}

/// Text after the first `marker`, trimmed
fn after(text: &str, marker: &str) -> Option<String> {
    text.find(marker)
        .map(|pos| text[pos + marker.len()..].trim().to_string())
}

/// Text after the first `marker` up to the earliest of `stops`, trimmed
fn section(text: &str, marker: &str, stops: &[&str]) -> Option<String> {
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = stops
        .iter()
        .filter_map(|stop| rest.find(stop))
        .min()
        .unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

/// Remove one pair of matching outer quotes, then trim
///
/// # Examples
///
/// ```
/// use webqa::agent::parser::clean_input_text;
///
/// assert_eq!(clean_input_text("'2 + 2'"), "2 + 2");
/// assert_eq!(clean_input_text("\" Paris \""), "Paris");
/// assert_eq!(clean_input_text("'mismatched\""), "'mismatched\"");
/// ```
pub fn clean_input_text(input: &str) -> String {
    for quote in ['\'', '"'] {
        if input.starts_with(quote) && input.ends_with(quote) {
            let inner = if input.len() >= 2 {
                &input[1..input.len() - 1]
            } else {
                ""
            };
            return inner.trim().to_string();
        }
    }
    input.trim().to_string()
}

/// Turn the raw `INPUT:` text into arguments for the named tool
pub fn parse_tool_input(tool_name: &str, raw_input: &str) -> Value {
    let input = clean_input_text(raw_input);

    match tool_name {
        "calculator" => json!({ "expression": input }),
        "datetime" => {
            if input.is_empty() || input.eq_ignore_ascii_case("none") {
                json!({})
            } else {
                json!({ "format": input })
            }
        }
        "web_search" => {
            let query = query_wrapper()
                .captures(&input)
                .map(|caps| caps[1].to_string())
                .unwrap_or(input);
            json!({ "query": query })
        }
        "datecalculator" => {
            let input = target_date_wrapper()
                .captures(&input)
                .map(|caps| caps[1].to_string())
                .unwrap_or(input);
            if input.is_empty() {
                return json!({});
            }
            if signed_integer().is_match(&input) {
                if let Ok(days) = input.parse::<i64>() {
                    return json!({ "days": days });
                }
            }
            json!({ "target_date": input })
        }
        _ => json!({}),
    }
}

/// Infer tool arguments from the question when the reply had no `INPUT:`
///
/// Only the date calculator gets anything: questions about time until a
/// date get no arguments, otherwise the first number in the question is
/// used as a day offset.
pub fn parse_tool_input_from_question(tool_name: &str, question: &str) -> Value {
    if tool_name != "datecalculator" {
        return json!({});
    }

    let lowered = question.to_lowercase();
    if lowered.contains("until") || lowered.contains("days to") {
        return json!({});
    }

    let days = first_number()
        .find(question)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(0);
    json!({ "days": days })
}

/// Parse a reasoning reply
///
/// # Examples
///
/// ```
/// use webqa::agent::parser::{parse_reply, ReplyAction};
///
/// let reply = parse_reply("THOUGHT: math\nTOOL: calculator\nINPUT: 2 + 2", "What is 2+2?");
/// assert_eq!(reply.thought.as_deref(), Some("math"));
/// assert!(matches!(reply.action, ReplyAction::UseTool { ref name, .. } if name == "calculator"));
/// ```
pub fn parse_reply(text: &str, question: &str) -> ParsedReply {
    let thought =
        section(text, THOUGHT, &[TOOL, INPUT, FINAL_ANSWER, THOUGHT]).filter(|t| !t.is_empty());

    let tool_pos = text.find(TOOL);
    let answer_first = match tool_pos {
        Some(pos) => text[..pos].contains(FINAL_ANSWER),
        None => true,
    };

    let action = if !answer_first {
        let name = after(text, TOOL)
            .and_then(|rest| rest.lines().next().map(|line| line.trim().to_string()))
            .unwrap_or_default();

        if name.is_empty() {
            ReplyAction::Nothing
        } else {
            let input = match section(text, INPUT, &[THOUGHT, FINAL_ANSWER, TOOL]) {
                Some(raw) => parse_tool_input(&name, &raw),
                None => parse_tool_input_from_question(&name, question),
            };
            ReplyAction::UseTool { name, input }
        }
    } else {
        match after(text, FINAL_ANSWER) {
            Some(answer) if !answer.is_empty() => ReplyAction::FinalAnswer(answer),
            _ => ReplyAction::Nothing,
        }
    };

    ParsedReply { thought, action }
}
