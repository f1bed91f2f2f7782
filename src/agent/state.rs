//! State carried through the reason/act loop

use serde::{Deserialize, Serialize};

/// One completed tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Reasoning that led to the tool call
    pub thought: String,
    /// Tool name
    pub tool: String,
    /// Tool arguments, rendered as compact JSON
    pub tool_input: String,
    /// Text the tool returned
    pub observation: String,
}

/// Mutable state of a single question's run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentState {
    /// The user's question
    pub question: String,
    /// Thought from the latest reasoning phase
    pub thought: Option<String>,
    /// Tool chosen by the latest reasoning phase
    pub tool_name: Option<String>,
    /// Arguments for the chosen tool
    pub tool_input: Option<serde_json::Value>,
    /// Output of the latest tool phase
    pub observation: Option<String>,
    /// Final answer, once the model gives one
    pub final_answer: Option<String>,
    /// Completed tool invocations, oldest first
    pub steps: Vec<Step>,
    /// Last error encountered
    pub error: Option<String>,
}

impl AgentState {
    /// Fresh state for a question
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    /// Render the question and previous steps for the reasoning prompt
    ///
    /// # Examples
    ///
    /// ```
    /// use webqa::agent::AgentState;
    ///
    /// let state = AgentState::new("What is 2+2?");
    /// assert_eq!(state.render_context(), "Question: What is 2+2?\n\n");
    /// ```
    pub fn render_context(&self) -> String {
        let mut context = format!("Question: {}\n\n", self.question);
        if self.steps.is_empty() {
            return context;
        }

        context.push_str("Previous steps:\n");
        for step in &self.steps {
            if !step.thought.is_empty() {
                context.push_str(&format!("Thought: {}\n", step.thought));
            }
            if !step.tool.is_empty() {
                context.push_str(&format!(
                    "Tool used: {} with input: {}\n",
                    step.tool, step.tool_input
                ));
            }
            if !step.observation.is_empty() {
                context.push_str(&format!("Observation: {}\n", step.observation));
            }
            context.push('\n');
        }
        context
    }

    /// Clear the per-phase decision fields before a new reasoning phase
    pub(crate) fn reset_decision(&mut self) {
        self.thought = None;
        self.tool_name = None;
        self.tool_input = None;
        self.final_answer = None;
    }
}

/// Result of answering one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaOutcome {
    /// The question asked
    pub question: String,
    /// Final answer or an apology
    pub answer: String,
    /// Tool invocations made along the way
    pub steps: Vec<Step>,
    /// Error that ended or disturbed the run, if any
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(thought: &str, tool: &str, input: &str, observation: &str) -> Step {
        Step {
            thought: thought.to_string(),
            tool: tool.to_string(),
            tool_input: input.to_string(),
            observation: observation.to_string(),
        }
    }

    #[test]
    fn test_context_with_steps() {
        let mut state = AgentState::new("What is 15 * 23?");
        state.steps.push(step(
            "Need math",
            "calculator",
            r#"{"expression":"15 * 23"}"#,
            "Result: 345",
        ));
        assert_eq!(
            state.render_context(),
            "Question: What is 15 * 23?\n\nPrevious steps:\nThought: Need math\nTool used: calculator with input: {\"expression\":\"15 * 23\"}\nObservation: Result: 345\n\n"
        );
    }

    #[test]
    fn test_context_skips_empty_fields() {
        let mut state = AgentState::new("q");
        state.steps.push(step("", "datetime", "{}", ""));
        assert_eq!(
            state.render_context(),
            "Question: q\n\nPrevious steps:\nTool used: datetime with input: {}\n\n"
        );
    }

    #[test]
    fn test_reset_decision_keeps_history() {
        let mut state = AgentState::new("q");
        state.tool_name = Some("calculator".to_string());
        state.final_answer = Some("4".to_string());
        state.steps.push(Step::default());
        state.error = Some("boom".to_string());
        state.reset_decision();
        assert!(state.tool_name.is_none());
        assert!(state.final_answer.is_none());
        assert_eq!(state.steps.len(), 1);
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_outcome_serializes() {
        let outcome = QaOutcome {
            question: "q".to_string(),
            answer: "a".to_string(),
            steps: vec![],
            error: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["answer"], "a");
        assert!(json["error"].is_null());
    }
}
