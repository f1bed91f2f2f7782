//! Prompts for answering a question from supplied context

use serde::Serialize;
use std::fmt;

/// Base system prompt for context answering
pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant that answers questions based on provided content.
Your role is to provide accurate, informative answers using ONLY the information provided in the context.

Guidelines:
1. Base your answers strictly on the provided content
2. If the context doesn't contain enough information to answer the question, clearly state this
3. Be concise but comprehensive in your responses
4. Cite specific information from the context when relevant
5. If the context contains conflicting information, acknowledge this
6. Do not make up or infer information not present in the context
7. Structure your answers clearly with paragraphs when appropriate";

/// Keyword-based question category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Dates, origins, chronology
    Historical,
    /// Similarities and differences
    Comparative,
    /// Causes, mechanisms, implications
    Analytical,
    /// Everything else
    Factual,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionType::Historical => "historical",
            QuestionType::Comparative => "comparative",
            QuestionType::Analytical => "analytical",
            QuestionType::Factual => "factual",
        };
        f.write_str(name)
    }
}

const HISTORICAL_KEYWORDS: &[&str] = &[
    "when",
    "date",
    "year",
    "who invented",
    "founded",
    "discovered",
    "history",
];

const COMPARATIVE_KEYWORDS: &[&str] = &[
    "compare",
    "difference",
    "similar",
    "versus",
    "vs",
    "better",
    "worse",
];

const ANALYTICAL_KEYWORDS: &[&str] = &[
    "why", "how does", "explain", "analyze", "cause", "effect", "impact",
];

/// Classify a question by substring keywords, checked in priority order
///
/// # Examples
///
/// ```
/// use webqa::prompts::answer_prompt::{classify_question, QuestionType};
///
/// assert_eq!(classify_question("When was Rust released?"), QuestionType::Historical);
/// assert_eq!(classify_question("What is the capital of Peru?"), QuestionType::Factual);
/// ```
pub fn classify_question(question: &str) -> QuestionType {
    let lowered = question.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if matches(HISTORICAL_KEYWORDS) {
        QuestionType::Historical
    } else if matches(COMPARATIVE_KEYWORDS) {
        QuestionType::Comparative
    } else if matches(ANALYTICAL_KEYWORDS) {
        QuestionType::Analytical
    } else {
        QuestionType::Factual
    }
}

/// System prompt specialized for a question type
pub fn system_prompt_for(question_type: QuestionType) -> String {
    let suffix = match question_type {
        QuestionType::Factual => {
            "For factual questions, focus on providing specific dates, names, and figures from the context."
        }
        QuestionType::Analytical => {
            "For analytical questions, explain the relationships and implications found in the context."
        }
        QuestionType::Comparative => {
            "For comparative questions, clearly outline similarities and differences found in the context."
        }
        QuestionType::Historical => {
            "For historical questions, pay special attention to chronology and cause-effect relationships in the context."
        }
    };
    format!("{}\n\n{}", SYSTEM_PROMPT, suffix)
}

/// Render the user message for context answering
pub fn render_user_prompt(question: &str, context: &str) -> String {
    format!(
        "Question: {}\n\nContext:\n{}\n\nPlease provide a comprehensive answer based solely on the above context.",
        question, context
    )
}
