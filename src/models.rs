//! Domain types shared by the stores, the HTTP layer and both persistence backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Assigned by the server on creation. Any client supplied value is replaced.
    #[serde(default)]
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Client supplied part of a poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PollBase {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub location: String,
    #[validate(length(min = 1, max = 100), custom = "validate_option_ranges")]
    pub options: Vec<PollOption>,
}

fn validate_option_ranges(options: &[PollOption]) -> Result<(), ValidationError> {
    if options.iter().all(|o| o.end > o.start) {
        Ok(())
    } else {
        Err(ValidationError::new("option_end_before_start"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    #[serde(skip)]
    pub account_id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub options: Vec<PollOption>,
}

impl Poll {
    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Available,
    Maybe,
    Unavailable,
}

impl Answer {
    pub const ALL: [Answer; 3] = [Answer::Available, Answer::Maybe, Answer::Unavailable];

    pub fn as_str(&self) -> &'static str {
        match self {
            Answer::Available => "available",
            Answer::Maybe => "maybe",
            Answer::Unavailable => "unavailable",
        }
    }

    /// "available, maybe, unavailable"
    pub fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(Answer::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Answer {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|a| a.as_str() == s).ok_or(())
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionAvailability {
    pub option_id: String,
    pub answer: Answer,
}

/// Availability entry as submitted, before the answer has been checked.
#[derive(Clone, Debug, Deserialize)]
pub struct AvailabilitySubmission {
    pub option_id: String,
    pub answer: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollAccountAvailability {
    pub poll_id: String,
    pub account_id: i64,
    pub availabilities: Vec<OptionAvailability>,
}
