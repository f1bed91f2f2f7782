//! Reasoning prompt for the reason/act loop
//!
//! The model is asked to reply in a line-oriented format: `THOUGHT:`, then
//! either `TOOL:` and `INPUT:` or `FINAL ANSWER:`. The markers are parsed by
//! [`crate::agent::parser`].

use crate::agent::ForceReason;

const REASONING_INSTRUCTIONS: &str = r#"Based on the question and any previous observations, reason about what to do next.

IMPORTANT: Check if you already have the complete answer from previous tool calls!
- If a tool has already provided the exact answer needed, provide your FINAL ANSWER immediately
- Do NOT call the same tool again with the same input
- Only use another tool if you need different or additional information

You can either:
1. Use a tool to gather more information (ONLY if needed)
2. Provide a final answer if you have enough information

Think step by step about what information is needed to answer the question.

NOTE: For weather questions without a specific location, you should acknowledge that you cannot provide current weather without knowing the location and provide a final answer explaining this limitation.

IMPORTANT: You MUST use tools to gather information. Do NOT try to answer without using tools first.

If you need to use a tool, respond in this format:
THOUGHT: [Your reasoning about what to do next]
TOOL: [tool_name]
INPUT: [For calculator: the expression, for web_search: the query, for datecalculator: just the number of days OR the target date string, for datetime: leave empty or specify format]

Only after you have used tools and gathered information, you can provide a final answer:
THOUGHT: [Your reasoning about why you can now answer]
FINAL ANSWER: [Your complete answer to the question based on the tool observations]

Rules:
- For ANY math calculation, you MUST use the calculator tool
- For current date/time questions (e.g., "what day is today"), use the datetime tool
- For date calculations (e.g., "what day will it be in X days" or "how many days until [date]"), use the datecalculator tool
- For ANY factual question, you MUST use the web_search tool
- NEVER provide an answer without first using the appropriate tool
- If a tool returns an error or unhelpful result after 2-3 attempts, provide the best answer you can based on available information
- If you see "Could not search the web" multiple times, acknowledge the limitation and provide a final answer
- Weather questions require location - if no location is specified, explain this in your final answer
"#;

/// Directive appended to the context when a force condition holds
///
/// # Examples
///
/// ```
/// use webqa::agent::ForceReason;
/// use webqa::prompts::reasoning_prompt::force_directive;
///
/// assert!(force_directive(ForceReason::LoopDetected).contains("stuck in a loop"));
/// ```
pub fn force_directive(reason: ForceReason) -> &'static str {
    match reason {
        ForceReason::CompleteAnswer => {
            "\n\nIMPORTANT: The previous tool call has already provided the complete answer to the question. You should now provide your FINAL ANSWER based on this information. Do NOT call the same tool again.\n\n"
        }
        ForceReason::LoopDetected => {
            "\n\nCRITICAL: STOP USING TOOLS! You are stuck in a loop. The same tool with the same input has been used multiple times. You MUST provide a FINAL ANSWER NOW. Do NOT use any more tools.\n\n"
        }
        ForceReason::MaxSteps => {
            "\n\nCRITICAL: MAXIMUM STEPS REACHED! You MUST provide a FINAL ANSWER NOW. Do NOT use any more tools.\n\n"
        }
    }
}

/// Render the full reasoning prompt
///
/// # Arguments
///
/// * `context` - Question, previous steps, and any force directive
/// * `tools_description` - One `- name: description` line per tool
pub fn render_reasoning_prompt(context: &str, tools_description: &str) -> String {
    format!(
        "{}\n\nAvailable tools:\n{}\n\n{}",
        context, tools_description, REASONING_INSTRUCTIONS
    )
}
