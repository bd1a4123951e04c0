use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Task urgency. Declaration order is the sort order: `Low` ranks first.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn index(self) -> usize {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    /// Next priority in declaration order, wrapping from `High` back to `Low`.
    pub fn cycle(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Ok(Priority::Low),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "high" | "h" => Ok(Priority::High),
            other => Err(anyhow!("invalid priority: {other} (expected low, medium or high)")),
        }
    }
}

/// Calendar due date, stored and displayed as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DueDate(NaiveDate);

impl DueDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn is_before(self, today: NaiveDate) -> bool {
        self.0 < today
    }
}

impl From<NaiveDate> for DueDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DUE_DATE_FORMAT))
    }
}

impl FromStr for DueDate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts unpadded fields; only the zero-padded form round-trips.
        let raw = s.trim();
        if raw.len() != "YYYY-MM-DD".len() {
            return Err(anyhow!("invalid due date {s:?} (expected YYYY-MM-DD)"));
        }
        NaiveDate::parse_from_str(raw, DUE_DATE_FORMAT)
            .map(Self)
            .map_err(|err| anyhow!("invalid due date {s:?}: {err} (expected YYYY-MM-DD)"))
    }
}

impl Serialize for DueDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,

    pub text: String,

    pub completed: bool,

    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DueDate>,
}

impl Task {
    pub fn new(id: u64, text: String, priority: Priority, due_date: Option<DueDate>) -> Self {
        Self {
            id,
            text,
            completed: false,
            priority,
            due_date,
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.map(|due| due.is_before(today)).unwrap_or(false)
    }
}
