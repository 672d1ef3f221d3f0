use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Completed,
    InProgress,
    Upcoming,
}

impl BookingStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::InProgress => "In Progress",
            Self::Upcoming => "Upcoming",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Completed => "text-muted",
            Self::InProgress => "text-success",
            Self::Upcoming => "text-primary",
        }
    }

    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Upcoming)
    }
}

/// How a booking's time window is compared against the current instant.
///
/// `StartTime` only looks at the start: any booking whose start has passed is
/// `Completed`, including one that is still running. `TimeWindow` compares
/// against both bounds and reports running bookings as `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusRule {
    #[default]
    StartTime,
    TimeWindow,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown booking status rule `{0}`; expected `start` or `window`")]
pub struct UnknownStatusRule(String);

impl FromStr for StatusRule {
    type Err = UnknownStatusRule;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Self::StartTime),
            "window" => Ok(Self::TimeWindow),
            other => Err(UnknownStatusRule(other.to_string())),
        }
    }
}

pub fn derive_status(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    now: DateTime<Utc>,
    rule: StatusRule,
) -> BookingStatus {
    match rule {
        StatusRule::StartTime => {
            if starts_at < now {
                BookingStatus::Completed
            } else if starts_at > now {
                BookingStatus::Upcoming
            } else {
                BookingStatus::InProgress
            }
        }
        StatusRule::TimeWindow => {
            if now < starts_at {
                BookingStatus::Upcoming
            } else if now < ends_at {
                BookingStatus::InProgress
            } else {
                BookingStatus::Completed
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingDuration {
    pub hours: i64,
    pub minutes: i64,
}

impl fmt::Display for BookingDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DurationError {
    #[error("booking ends {seconds}s before it starts")]
    EndsBeforeStart { seconds: i64 },
}

pub fn booking_duration(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> Result<BookingDuration, DurationError> {
    let seconds = (ends_at - starts_at).num_seconds();
    if seconds < 0 {
        return Err(DurationError::EndsBeforeStart { seconds: -seconds });
    }

    Ok(BookingDuration {
        hours: seconds / 3600,
        minutes: (seconds % 3600) / 60,
    })
}
