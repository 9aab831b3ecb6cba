//! Core data models for the heal backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cycle length assumed when a history carries no usable average
pub const DEFAULT_CYCLE_LENGTH_DAYS: i32 = 28;

/// How predictable a user's cycle is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleRegularity {
    #[default]
    Regular,
    Irregular,
    VeryIrregular,
}

impl CycleRegularity {
    /// Parse a stored label; `None` for anything outside the known set
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "regular" => Some(CycleRegularity::Regular),
            "irregular" => Some(CycleRegularity::Irregular),
            "very_irregular" => Some(CycleRegularity::VeryIrregular),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CycleRegularity::Regular => "regular",
            CycleRegularity::Irregular => "irregular",
            CycleRegularity::VeryIrregular => "very_irregular",
        }
    }
}

/// Cycle data captured by a screening
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CycleHistory {
    /// Start instants of past periods, in no particular order
    pub recent_periods: Vec<DateTime<Utc>>,
    /// Average cycle length in days, `None` when absent or non-numeric
    pub avg_cycle_length: Option<i32>,
    pub cycle_regularity: CycleRegularity,
}

impl CycleHistory {
    /// Average cycle length with the default applied.
    ///
    /// Zero and negative stored values are returned as-is.
    pub fn cycle_length_days(&self) -> i32 {
        self.avg_cycle_length.unwrap_or(DEFAULT_CYCLE_LENGTH_DAYS)
    }

    /// Most recent period start, if any
    pub fn latest_period(&self) -> Option<DateTime<Utc>> {
        self.recent_periods.iter().max().copied()
    }
}

/// A screening document under `users/{uid}/screenings/{sid}`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Screening {
    pub screening_id: String,
    pub user_id: String,
    pub version: Option<String>,
    pub source: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cycle_history: Option<CycleHistory>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Daily reminder time as `HH:MM`
    #[serde(default)]
    pub reminder_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Risk {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CycleSummary {
    #[serde(default)]
    pub last_period_start: Option<String>,
    #[serde(default)]
    pub last_period_end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PadUsage {
    #[serde(default)]
    pub status: Option<String>,
}

/// Precomputed fields shown on the app's landing page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandingPageSummary {
    #[serde(default)]
    pub risk: Option<Risk>,
    #[serde(default)]
    pub heal_journey: Option<String>,
    #[serde(default)]
    pub next_yoga: Option<String>,
    #[serde(default)]
    pub cycle: Option<CycleSummary>,
    #[serde(default)]
    pub pad_usage: Option<PadUsage>,
}

/// Top-level user document under `users/{uid}`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct User {
    /// Document id
    pub id: String,
    pub user_id: Option<String>,
    pub schema_version: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub profile: Option<UserProfile>,
    pub preferences: Option<UserPreferences>,
    pub landing_page_summary: Option<LandingPageSummary>,
}

/// Landing page view returned to the app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLanding {
    pub profile: Option<UserProfile>,
    pub preferences: Option<UserPreferences>,
    pub landing_page_summary: Option<LandingPageSummary>,
}

impl From<User> for UserLanding {
    fn from(user: User) -> Self {
        Self {
            profile: user.profile,
            preferences: user.preferences,
            landing_page_summary: user.landing_page_summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssessmentLog {
    pub assessment_id: String,
    pub questionnaire_version: String,
    pub answers: Map<String, Value>,
    pub result: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PeriodLog {
    pub period_log_id: String,
    /// `start` or `end`
    pub action: String,
    /// Calendar date as `YYYY-MM-DD`
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct YogaAttendanceLog {
    pub attendance_id: String,
    pub attended: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PadLog {
    pub pad_log_id: String,
    pub action: String,
    pub pad_status: String,
}
