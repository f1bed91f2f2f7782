//! Date arithmetic tool
//!
//! Answers two kinds of questions relative to today's local date: which
//! date lies a number of days away, and how many days separate today from a
//! target date given as free-form text.

use crate::error::{Result, WebQaError};
use crate::tools::{string_arg, Clock, SystemClock, ToolExecutor, ToolResult};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Display format for full dates, e.g. `Thursday, November 20, 2025`
const LONG_DATE: &str = "%A, %B %d, %Y";

/// Display format for target dates, e.g. `November 27, 2025`
const SHORT_DATE: &str = "%B %d, %Y";

/// Largest day offset accepted; keeps the arithmetic well inside chrono's range
const MAX_DAY_OFFSET: u64 = 3_000_000;

const FORMATS_WITH_YEAR: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%B %d %Y",
    "%d %B %Y",
    "%Y %B %d",
];

const FORMATS_WITHOUT_YEAR: &[&str] = &["%B %d", "%d %B", "%m/%d"];

fn ordinal_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("ordinal regex is valid")
    })
}

fn weekday_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)[a-z]*\.?\s+")
            .expect("weekday regex is valid")
    })
}

fn iso_timestamp() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})[T ]").expect("timestamp regex is valid")
    })
}

/// Parse a free-form date string
///
/// Accepts ISO dates (optionally with a time part), `Month D, YYYY`,
/// `D Month YYYY`, `MM/DD/YYYY`, ordinal suffixes (`27th`), a leading
/// weekday, and the words `today`, `tomorrow`, `yesterday`. A date without
/// a year falls in `today`'s year.
///
/// # Errors
///
/// Returns `WebQaError::DateParse` when no supported format matches
pub fn parse_date(input: &str, today: NaiveDate) -> std::result::Result<NaiveDate, WebQaError> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if let Some(caps) = iso_timestamp().captures(trimmed) {
        if let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") {
            return Ok(date);
        }
    }

    let normalized = trimmed.replace(',', " ");
    let normalized = ordinal_suffix().replace_all(&normalized, "$1");
    let normalized = weekday_prefix().replace(&normalized, "");
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    if normalized.is_empty() {
        return Err(WebQaError::DateParse("empty date string".to_string()));
    }

    for fmt in FORMATS_WITH_YEAR {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, fmt) {
            return Ok(date);
        }
    }

    let with_year = format!("{} {}", normalized, today.year());
    for fmt in FORMATS_WITHOUT_YEAR {
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, &format!("{} %Y", fmt)) {
            return Ok(date);
        }
    }

    Err(WebQaError::DateParse(format!(
        "unrecognized date '{}'",
        normalized
    )))
}

/// Tool for calculating future or past dates
pub struct DateCalculatorTool {
    clock: Arc<dyn Clock>,
}

impl Default for DateCalculatorTool {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl DateCalculatorTool {
    /// Create a date calculator reading today's date from the given clock
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Count days between today and a free-form target date
    pub fn days_until(&self, target_date: &str) -> ToolResult {
        let today = self.today();
        let target = match parse_date(target_date, today) {
            Ok(date) => date,
            Err(e) => {
                tracing::debug!("Failed to parse target date '{}': {}", target_date, e);
                return ToolResult::error(format!(
                    "Could not parse date '{}'. Please use formats like 'November 27, 2025' or '2025-11-27'. {}",
                    target_date, e
                ));
            }
        };

        let diff = (target - today).num_days();
        let target_short = target.format(SHORT_DATE);
        if diff == 0 {
            return ToolResult::success(format!("The target date {} is today!", target_short));
        }

        let (heading, label, amount) = if diff > 0 {
            ("Days until", "Days until", format!("{} days", diff))
        } else {
            ("Days since", "Days since", format!("{} days ago", -diff))
        };

        ToolResult::success(format!(
            "{} {}:\n- Today: {}\n- Target: {}\n- {}: {}",
            heading,
            target_short,
            today.format(LONG_DATE),
            target.format(LONG_DATE),
            label,
            amount
        ))
    }

    /// Describe the date a number of days away from today
    pub fn offset_days(&self, days: i64) -> ToolResult {
        let today = self.today();
        if days == 0 {
            return ToolResult::success(format!("Today is {}", today.format(LONG_DATE)));
        }
        if days.unsigned_abs() > MAX_DAY_OFFSET {
            return ToolResult::error(format!("Invalid input. {} days is out of range", days));
        }
        let Some(target) = today.checked_add_signed(Duration::days(days)) else {
            return ToolResult::error(format!("Invalid input. {} days is out of range", days));
        };

        let (offset_line, verdict) = if days > 0 {
            (format!("{} days from today", days), "That will be a")
        } else {
            (format!("{} days ago", -days), "That was a")
        };

        ToolResult::success(format!(
            "Date calculation:\n- Today: {}\n- {}: {}\n- {} {}",
            today.format(LONG_DATE),
            offset_line,
            target.format(LONG_DATE),
            verdict,
            target.format("%A")
        ))
    }

    /// Today's full date
    pub fn today_summary(&self) -> ToolResult {
        ToolResult::success(format!("Today is {}", self.today().format(LONG_DATE)))
    }
}

/// Read the `days` argument from a number or numeric string
fn days_arg(args: &serde_json::Value) -> std::result::Result<Option<i64>, String> {
    match args.get("days") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .map(Some)
            .ok_or_else(|| format!("invalid days value {}", n)),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| format!("invalid literal for days: '{}'", s)),
        Some(other) => Err(format!("invalid days value {}", other)),
    }
}

#[async_trait]
impl ToolExecutor for DateCalculatorTool {
    fn name(&self) -> &str {
        "datecalculator"
    }

    fn description(&self) -> &str {
        "Calculates dates and days between dates. Use for: 1) 'what day will it be in X days' (provide days=X), 2) 'how many days until [date]' (provide target_date='date string'). Accepts either days (integer) OR target_date (date string like 'November 27, 2025' or '2025-11-27')."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "integer",
                    "description": "Days to add to today (negative for the past)"
                },
                "target_date": {
                    "type": "string",
                    "description": "Date to count days until, e.g. 'November 27, 2025'"
                }
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        if let Some(target) = string_arg(&args, "target_date") {
            return Ok(self.days_until(target));
        }
        match days_arg(&args) {
            Ok(Some(days)) => Ok(self.offset_days(days)),
            Ok(None) => Ok(self.today_summary()),
            Err(reason) => Ok(ToolResult::error(format!("Invalid input. {}", reason))),
        }
    }
}
