//! Parsing and display helpers shared by the CLI and the TUI.

use chrono::{Datelike, Duration, NaiveDate};

use crate::fields::*;

/// Parse human-readable due date input with smart natural language support.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "next monday", "this friday", bare weekday names
/// - "end of week", "end of month", "weekend"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "yesterday" => return today.pred_opt(),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        "this weekend" | "weekend" => {
            let days_until_saturday = (5 + 7 - today.weekday().num_days_from_monday() as i64) % 7;
            return Some(today + Duration::days(days_until_saturday));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let split = rest.char_indices().last().map_or(0, |(i, _)| i);
        let (num, unit) = rest.split_at(split);
        if let Ok(n) = num.trim().parse::<i64>() {
            // Out-of-range offsets are not valid dates.
            let offset = match unit {
                "d" => Duration::try_days(n),
                "w" => Duration::try_weeks(n),
                // Approximate: 30 days per month
                "m" => n.checked_mul(30).and_then(Duration::try_days),
                _ => None,
            };
            return offset.and_then(|d| today.checked_add_signed(d));
        }
    }

    let weekday_target = |name: &str| -> Option<i64> {
        const DAYS: [(&str, &str); 7] = [
            ("monday", "mon"),
            ("tuesday", "tue"),
            ("wednesday", "wed"),
            ("thursday", "thu"),
            ("friday", "fri"),
            ("saturday", "sat"),
            ("sunday", "sun"),
        ];
        DAYS.iter()
            .position(|(long, short)| name == *long || name == *short)
            .map(|i| i as i64)
    };
    let current = today.weekday().num_days_from_monday() as i64;

    if let Some(name) = s.strip_prefix("next ") {
        if let Some(target) = weekday_target(name) {
            let ahead = (target + 7 - current) % 7;
            return Some(today + Duration::days(if ahead == 0 { 7 } else { ahead + 7 }));
        }
    }
    let bare = s.strip_prefix("this ").unwrap_or(&s);
    if let Some(target) = weekday_target(bare) {
        return Some(today + Duration::days((target + 7 - current) % 7));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Monday and Sunday of the ISO week containing `today`.
pub fn start_end_of_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    (start, start + Duration::days(6))
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            if days == 0 {
                "today".into()
            } else if days == 1 {
                "tomorrow".into()
            } else if days > 1 {
                format!("in {}d", days)
            } else {
                format!("{}d late", -days)
            }
        }
    }
}

/// Format a due date for text fields ("" when unset).
pub fn format_due_input(due: Option<NaiveDate>) -> String {
    due.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::NotStarted => "Not Started",
        Status::InProgress => "In Progress",
        Status::Completed => "Completed",
    }
}

/// Format a priority level for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::High => "High",
        Priority::Medium => "Medium",
        Priority::Low => "Low",
    }
}

/// Format a filter selection, showing "All" for no restriction.
pub fn format_selection<T: Copy>(sel: Selection<T>, fmt: fn(T) -> &'static str) -> &'static str {
    match sel {
        Selection::All => "All",
        Selection::Only(v) => fmt(v),
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
