use chrono::{DateTime, Local};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit a duration was entered in. Only kept for redisplay; stored durations
/// are always seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hour,
    Minute,
    Second,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 3] = [TimeUnit::Hour, TimeUnit::Minute, TimeUnit::Second];

    pub fn seconds(&self) -> u64 {
        match self {
            TimeUnit::Hour => 3600,
            TimeUnit::Minute => 60,
            TimeUnit::Second => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Hour => "hour",
            TimeUnit::Minute => "minute",
            TimeUnit::Second => "second",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            TimeUnit::Hour => TimeUnit::Minute,
            TimeUnit::Minute => TimeUnit::Second,
            TimeUnit::Second => TimeUnit::Hour,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            TimeUnit::Hour => TimeUnit::Second,
            TimeUnit::Minute => TimeUnit::Hour,
            TimeUnit::Second => TimeUnit::Minute,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = TimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hour" | "hours" | "h" => Ok(TimeUnit::Hour),
            "minute" | "minutes" | "min" | "m" => Ok(TimeUnit::Minute),
            "second" | "seconds" | "sec" | "s" => Ok(TimeUnit::Second),
            other => Err(TimerError::UnknownUnit(other.to_string())),
        }
    }
}

/// Converts a duration entered in `unit` to seconds.
pub fn normalize_duration(duration: u64, unit: TimeUnit) -> u64 {
    duration.saturating_mul(unit.seconds())
}

/// Renders a second count as `M:SS`. Minutes are not padded and may exceed 59.
pub fn format_remaining(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Stable task identifier, assigned once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    pub fn generate() -> Self {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        TaskId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    /// Total duration in seconds.
    pub duration: u64,
    pub unit: TimeUnit,
    pub created_at: DateTime<Local>,
}

impl Task {
    /// Builds a task from raw form values. `text` must already be trimmed.
    pub fn new(id: TaskId, text: String, duration: u64, unit: TimeUnit) -> Self {
        Task {
            id,
            text,
            duration: normalize_duration(duration, unit),
            unit,
            created_at: Local::now(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("task text is required")]
    EmptyText,
    #[error("no task is being edited")]
    NotEditing,
    #[error("no task at position {0}")]
    IndexOutOfRange(usize),
    #[error("a task is already running")]
    AlreadyRunning,
    #[error("there are no tasks to start")]
    NothingToStart,
    #[error("countdown is at zero")]
    CountdownExhausted,
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),
    #[error("unknown unit {0:?} (use hour, minute or second)")]
    UnknownUnit(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_duration_by_unit() {
        assert_eq!(normalize_duration(2, TimeUnit::Hour), 7200);
        assert_eq!(normalize_duration(2, TimeUnit::Minute), 120);
        assert_eq!(normalize_duration(2, TimeUnit::Second), 2);
        assert_eq!(normalize_duration(u64::MAX, TimeUnit::Hour), u64::MAX);
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(0), "0:00");
        assert_eq!(format_remaining(9), "0:09");
        assert_eq!(format_remaining(59), "0:59");
        assert_eq!(format_remaining(60), "1:00");
        assert_eq!(format_remaining(3661), "61:01");
    }

    #[test]
    fn test_time_unit_parse() {
        assert_eq!("hour".parse::<TimeUnit>(), Ok(TimeUnit::Hour));
        assert_eq!(" Minutes ".parse::<TimeUnit>(), Ok(TimeUnit::Minute));
        assert_eq!("s".parse::<TimeUnit>(), Ok(TimeUnit::Second));
        assert_eq!(
            "fortnight".parse::<TimeUnit>(),
            Err(TimerError::UnknownUnit("fortnight".into()))
        );
    }

    #[test]
    fn test_time_unit_cycle() {
        for unit in TimeUnit::ALL {
            assert_eq!(unit.next().prev(), unit);
        }
        assert_eq!(TimeUnit::Second.next(), TimeUnit::Hour);
    }

    #[test]
    fn test_task_keeps_entered_unit() {
        let task = Task::new(TaskId::generate(), "Read".into(), 3, TimeUnit::Minute);
        assert_eq!(task.duration, 180);
        assert_eq!(task.unit, TimeUnit::Minute);
    }

    #[test]
    fn test_task_id_generate() {
        let id = TaskId::generate();
        assert_eq!(id.as_str().len(), 6);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
