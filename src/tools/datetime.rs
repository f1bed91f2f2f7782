//! Current date and time tool

use crate::error::Result;
use crate::tools::{string_arg, Clock, SystemClock, ToolExecutor, ToolResult};
use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, FixedOffset};
use std::sync::Arc;

/// Tool for getting current date and time information
pub struct DateTimeTool {
    clock: Arc<dyn Clock>,
}

impl Default for DateTimeTool {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl DateTimeTool {
    /// Create a datetime tool reading from the given clock
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Describe the current moment, optionally with a strftime format
    pub fn describe(&self, format: Option<&str>) -> ToolResult {
        let now = self.clock.now();
        match format {
            Some(fmt) if !fmt.is_empty() => render_with_format(&now, fmt),
            _ => ToolResult::success(summary(&now)),
        }
    }
}

fn render_with_format(now: &DateTime<FixedOffset>, fmt: &str) -> ToolResult {
    let items: Vec<Item<'_>> = StrftimeItems::new(fmt).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return ToolResult::error(format!(
            "Invalid format string '{}'. unsupported strftime specifier",
            fmt
        ));
    }
    ToolResult::success(now.format_with_items(items.into_iter()).to_string())
}

fn summary(now: &DateTime<FixedOffset>) -> String {
    format!(
        "Current date and time:\n- Date: {}\n- Time: {}\n- Day: {}\n- Month: {}\n- Year: {}\n- Timezone: Local system time",
        now.format("%Y-%m-%d"),
        now.format("%H:%M:%S"),
        now.format("%A"),
        now.format("%B"),
        now.year()
    )
}

#[async_trait]
impl ToolExecutor for DateTimeTool {
    fn name(&self) -> &str {
        "datetime"
    }

    fn description(&self) -> &str {
        "Gets current date, time, day of week, and other temporal information. Use when questions ask about 'today', 'current time', 'what day', etc."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "Optional strftime format, e.g. '%Y-%m-%d'"
                }
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        Ok(self.describe(string_arg(&args, "format")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::FixedClock;

    fn tool() -> DateTimeTool {
        DateTimeTool::new(Arc::new(
            FixedClock::parse("2025-11-20T14:05:09+00:00").unwrap(),
        ))
    }

    #[test]
    fn test_summary_block() {
        let result = tool().describe(None);
        assert_eq!(
            result.to_message(),
            "Current date and time:\n- Date: 2025-11-20\n- Time: 14:05:09\n- Day: Thursday\n- Month: November\n- Year: 2025\n- Timezone: Local system time"
        );
    }

    #[test]
    fn test_custom_format() {
        assert_eq!(tool().describe(Some("%Y/%m/%d")).to_message(), "2025/11/20");
        assert_eq!(tool().describe(Some("%A")).to_message(), "Thursday");
    }

    #[test]
    fn test_empty_format_falls_back_to_summary() {
        assert!(tool()
            .describe(Some(""))
            .to_message()
            .starts_with("Current date and time:"));
    }

    #[test]
    fn test_invalid_format_is_error_observation() {
        let result = tool().describe(Some("%Q"));
        assert!(!result.success);
        assert!(result.to_message().starts_with("Error: Invalid format string '%Q'"));
    }

    #[tokio::test]
    async fn test_execute_ignores_null_format() {
        let result = tool()
            .execute(serde_json::json!({"format": null}))
            .await
            .unwrap();
        assert!(result.output.starts_with("Current date and time:"));
    }
}
