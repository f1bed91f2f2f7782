//! Loop guard for the reason/act loop
//!
//! Decides when the model should be pushed to stop calling tools: the last
//! tool already answered the question, the same call keeps repeating, or the
//! step budget is spent.

use serde::Serialize;
use std::fmt;

use super::state::Step;

/// Why the model is being told to give a final answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceReason {
    /// The last observation already answers the question
    CompleteAnswer,
    /// The same tool was called with the same input repeatedly
    LoopDetected,
    /// The step budget is exhausted
    MaxSteps,
}

impl fmt::Display for ForceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForceReason::CompleteAnswer => "complete_answer",
            ForceReason::LoopDetected => "loop_detected",
            ForceReason::MaxSteps => "max_steps",
        };
        f.write_str(name)
    }
}

/// Checks step history for stop conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopGuard {
    max_steps: usize,
    loop_window: usize,
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new(10, 3)
    }
}

impl LoopGuard {
    /// Create a guard
    ///
    /// # Arguments
    ///
    /// * `max_steps` - Steps after which a final answer is demanded
    /// * `loop_window` - Number of identical trailing calls that count as a loop
    pub fn new(max_steps: usize, loop_window: usize) -> Self {
        Self {
            max_steps,
            loop_window,
        }
    }

    /// Check the history, returning the first condition that holds
    ///
    /// Conditions are checked in order: complete answer, loop, max steps.
    ///
    /// # Examples
    ///
    /// ```
    /// use webqa::agent::{ForceReason, LoopGuard, Step};
    ///
    /// let guard = LoopGuard::new(10, 3);
    /// let step = Step {
    ///     tool: "calculator".to_string(),
    ///     observation: "Result: 4".to_string(),
    ///     ..Default::default()
    /// };
    /// assert_eq!(guard.check(&[step]), Some(ForceReason::CompleteAnswer));
    /// assert_eq!(guard.check(&[]), None);
    /// ```
    pub fn check(&self, steps: &[Step]) -> Option<ForceReason> {
        let last = steps.last()?;

        if answers_question(last) {
            return Some(ForceReason::CompleteAnswer);
        }

        if self.loop_window > 0 && steps.len() >= self.loop_window {
            let window = &steps[steps.len() - self.loop_window..];
            let first = &window[0];
            if window
                .iter()
                .all(|s| s.tool == first.tool && s.tool_input == first.tool_input)
            {
                return Some(ForceReason::LoopDetected);
            }
        }

        if steps.len() >= self.max_steps {
            return Some(ForceReason::MaxSteps);
        }

        None
    }
}

/// Whether an observation is a self-contained answer
fn answers_question(step: &Step) -> bool {
    let obs = step.observation.as_str();
    (obs.contains("Date calculation:") && (obs.contains("will be a") || obs.contains("was a")))
        || obs.contains("Days until")
        || obs.contains("Days since")
        || (obs.contains("Result:") && step.tool == "calculator")
        || obs.contains("Current date and time:")
}
