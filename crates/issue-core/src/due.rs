use crate::board::Card;
use crate::error::{BoardError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Parse a `due` value. Anything other than a `YYYY-MM-DD` calendar date is
/// treated as "no due date".
pub fn parse_due(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Strict variant used for user input on the command line.
pub fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    parse_due(raw).ok_or_else(|| BoardError::InvalidDate(raw.to_string()))
}

/// Monday and Sunday of the week containing `today`.
pub fn week_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    (monday, monday + Duration::days(6))
}

/// Order by due date: earliest first, undated last.
pub fn by_due(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Urgency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Urgency {
    Overdue { days: i64 },
    DueToday,
    DueTomorrow,
    /// Due after tomorrow but no later than this Sunday.
    ThisWeek,
    Later,
    NoDueDate,
}

impl Urgency {
    pub fn classify(due: Option<NaiveDate>, today: NaiveDate) -> Self {
        let Some(due) = due else {
            return Urgency::NoDueDate;
        };
        let delta = (due - today).num_days();
        if delta < 0 {
            return Urgency::Overdue { days: -delta };
        }
        match delta {
            0 => Urgency::DueToday,
            1 => Urgency::DueTomorrow,
            _ if due <= week_bounds(today).1 => Urgency::ThisWeek,
            _ => Urgency::Later,
        }
    }

    pub fn for_card(card: &Card, today: NaiveDate) -> Self {
        Self::classify(card.due_date(), today)
    }

    /// True for anything that belongs in the "this week" focus list.
    pub fn is_pressing(&self, due: Option<NaiveDate>, today: NaiveDate) -> bool {
        match self {
            Urgency::Overdue { .. } | Urgency::DueToday | Urgency::ThisWeek => true,
            Urgency::DueTomorrow => due.is_some_and(|d| d <= week_bounds(today).1),
            Urgency::Later | Urgency::NoDueDate => false,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Overdue { days } => write!(f, "{days}d overdue"),
            Urgency::DueToday => f.write_str("due today"),
            Urgency::DueTomorrow => f.write_str("due tomorrow"),
            Urgency::ThisWeek => f.write_str("due this week"),
            Urgency::Later => f.write_str("due later"),
            Urgency::NoDueDate => f.write_str("no due date"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
