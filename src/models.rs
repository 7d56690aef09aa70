use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Month, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// One observation row from the crowd dataset.
///
/// Hour and month are derived from `timestamp` on demand and never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub crowd_density: Option<String>,
    pub stress_level: Option<String>,
    pub activity_type: Option<String>,
    pub incident_type: Option<String>,
    pub queue_time_minutes: Option<f64>,
    pub satisfaction_rating: Option<f64>,
    pub navigation_success: Option<String>,
    pub health_condition: Option<String>,
    pub temperature: Option<f64>,
    pub time_spent_minutes: Option<f64>,
    pub age_group: Option<String>,
    pub nationality: Option<String>,
}

impl EventRecord {
    pub fn hour(&self) -> Option<u32> {
        self.timestamp.map(|ts| ts.hour())
    }

    /// Full English month name, e.g. `January`.
    pub fn month_name(&self) -> Option<&'static str> {
        self.timestamp
            .and_then(|ts| u8::try_from(ts.month()).ok())
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
    }

    pub fn month_number(&self) -> Option<u32> {
        self.timestamp.map(|ts| ts.month())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DensityLevel {
    Low,
    Medium,
    High,
}

impl DensityLevel {
    pub const ALL: [DensityLevel; 3] = [DensityLevel::Low, DensityLevel::Medium, DensityLevel::High];

    /// Matches an already-normalized density label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Low" => Some(DensityLevel::Low),
            "Medium" => Some(DensityLevel::Medium),
            "High" => Some(DensityLevel::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DensityLevel::Low => "Low",
            DensityLevel::Medium => "Medium",
            DensityLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityBreakdown {
    pub density: DensityLevel,
    pub stress_counts: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyActivity {
    pub hour: u32,
    pub activity_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Values of one measure for one navigation-success flag value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitDistribution {
    pub navigation_success: String,
    pub values: Vec<f64>,
    pub summary: Option<BoxSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthBubble {
    pub health_condition: String,
    pub temperature: f64,
    pub mean_time_spent_minutes: Option<f64>,
    pub incident_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicCount {
    pub age_group: String,
    pub nationality: String,
    pub health_condition: String,
    pub count: usize,
}

/// The seven chart datasets behind the analytics view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub month: Option<String>,
    pub density_stress: Vec<DensityBreakdown>,
    pub hourly_activity: Vec<HourlyActivity>,
    pub incidents_by_hour: Vec<HourCount>,
    pub queue_time_by_navigation: Vec<SplitDistribution>,
    pub satisfaction_by_navigation: Vec<SplitDistribution>,
    pub health_bubbles: Vec<HealthBubble>,
    pub demographics: Vec<DemographicCount>,
}

impl ChartSet {
    pub fn is_empty(&self) -> bool {
        self.density_stress.iter().all(|b| b.stress_counts.is_empty())
            && self.hourly_activity.is_empty()
            && self.incidents_by_hour.is_empty()
            && self.queue_time_by_navigation.is_empty()
            && self.satisfaction_by_navigation.is_empty()
            && self.health_bubbles.is_empty()
            && self.demographics.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub color: &'static str,
    pub severity: u8,
    pub label: String,
}

/// Flat marker list plus the view settings a cluster renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerLayer {
    pub center: [f64; 2],
    pub zoom: u8,
    pub radius: u8,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Crowd personality labels, declared in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Strategist,
    Explorer,
    Follower,
    Observer,
    Responder,
}

impl Label {
    pub const ALL: [Label; 5] = [
        Label::Strategist,
        Label::Explorer,
        Label::Follower,
        Label::Observer,
        Label::Responder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Strategist => "Strategist",
            Label::Explorer => "Explorer",
            Label::Follower => "Follower",
            Label::Observer => "Observer",
            Label::Responder => "Responder",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Label::ALL
            .into_iter()
            .find(|label| label.as_str() == value)
            .ok_or_else(|| format!("unknown personality label: {value}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Agree,
    Neutral,
    Disagree,
}

impl Answer {
    /// Accepts the quiz vocabulary after trimming; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Agree" => Some(Answer::Agree),
            "Neutral" => Some(Answer::Neutral),
            "Disagree" => Some(Answer::Disagree),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizAnswers {
    pub q1: Answer,
    pub q2: Answer,
    pub q3: Answer,
    pub q4: Answer,
    pub q5: Answer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalityResult {
    pub id: i64,
    pub user_id: UserId,
    pub label: Label,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub label: Label,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn derives_hour_and_month_from_timestamp() {
        let record = EventRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 9).and_then(|d| d.and_hms_opt(17, 45, 0)),
            ..EventRecord::default()
        };
        assert_eq!(record.hour(), Some(17));
        assert_eq!(record.month_name(), Some("March"));

        let blank = EventRecord::default();
        assert_eq!(blank.hour(), None);
        assert_eq!(blank.month_name(), None);
    }

    #[test]
    fn labels_round_trip_through_text() {
        for label in Label::ALL {
            assert_eq!(label.as_str().parse::<Label>(), Ok(label));
        }
        assert!("Leader".parse::<Label>().is_err());
    }

    #[test]
    fn answers_accept_only_the_vocabulary() {
        assert_eq!(Answer::parse(" Agree "), Some(Answer::Agree));
        assert_eq!(Answer::parse("Disagree"), Some(Answer::Disagree));
        assert_eq!(Answer::parse("agree"), None);
        assert_eq!(Answer::parse(""), None);
    }
}
