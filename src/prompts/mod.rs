//! Prompts for the reasoning loop and for context answering
//!
//! The reasoning prompt drives tool selection; the answer prompts are used
//! when a question is answered directly from supplied text.

pub mod answer_prompt;
pub mod reasoning_prompt;

pub use answer_prompt::{classify_question, QuestionType};
pub use reasoning_prompt::{force_directive, render_reasoning_prompt};
