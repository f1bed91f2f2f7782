//! Agent module for WebQA
//!
//! This module contains the reason/act loop, the parsing of the model's
//! replies, the loop guard, and progress reporting.

pub mod core;
pub mod guard;
pub mod parser;
pub mod reporter;
pub mod state;

pub use core::{Agent, NO_ANSWER, TOO_MANY_STEPS_ANSWER};
pub use guard::{ForceReason, LoopGuard};
pub use reporter::{ConsoleReporter, ProgressReporter, SilentReporter};
pub use state::{AgentState, QaOutcome, Step};
