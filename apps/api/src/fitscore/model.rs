//! Value objects consumed by the FitScore engine.
//!
//! Profiles and postings are immutable inputs: the engine borrows them and never mutates.
//! Wire names follow the marketplace data contract (`available_times`, `culture_tags`,
//! `fitscore_threshold`, ...).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type EntityId = i64;

// ────────────────────────────────────────────────────────────────────────────
// Role type
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoleType {
    #[serde(rename = "Group Fitness Instructor")]
    GroupFitnessInstructor,
    #[serde(rename = "Personal Trainer")]
    PersonalTrainer,
    #[serde(rename = "Yoga Instructor")]
    YogaInstructor,
    #[serde(rename = "Pilates Instructor")]
    PilatesInstructor,
}

impl RoleType {
    pub const ALL: [RoleType; 4] = [
        RoleType::GroupFitnessInstructor,
        RoleType::PersonalTrainer,
        RoleType::YogaInstructor,
        RoleType::PilatesInstructor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::GroupFitnessInstructor => "Group Fitness Instructor",
            RoleType::PersonalTrainer => "Personal Trainer",
            RoleType::YogaInstructor => "Yoga Instructor",
            RoleType::PilatesInstructor => "Pilates Instructor",
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleType::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| format!("unknown role type '{s}'"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Weekly availability grid: 7 days × {AM, PM, Evening}
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
            Day::Sat => "Sat",
            Day::Sun => "Sun",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayPeriod {
    Am,
    Pm,
    Evening,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 3] = [DayPeriod::Am, DayPeriod::Pm, DayPeriod::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPeriod::Am => "AM",
            DayPeriod::Pm => "PM",
            DayPeriod::Evening => "Evening",
        }
    }
}

/// One cell of the 21-slot weekly grid. Serialized as `"Mon AM"`, `"Sat Evening"`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot {
    pub day: Day,
    pub period: DayPeriod,
}

impl TimeSlot {
    pub fn new(day: Day, period: DayPeriod) -> Self {
        Self { day, period }
    }

    /// Every slot in the weekly grid, in day-major order.
    pub fn grid() -> impl Iterator<Item = TimeSlot> {
        Day::ALL
            .into_iter()
            .flat_map(|day| DayPeriod::ALL.into_iter().map(move |p| TimeSlot::new(day, p)))
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day.as_str(), self.period.as_str())
    }
}

impl FromStr for TimeSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(day), Some(period), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("invalid time slot '{s}'"));
        };
        let day = Day::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(day))
            .ok_or_else(|| format!("invalid day in time slot '{s}'"))?;
        let period = DayPeriod::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(period))
            .ok_or_else(|| format!("invalid period in time slot '{s}'"))?;
        Ok(TimeSlot::new(day, period))
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_string()
    }
}

/// Parses a list of wire slot strings into a set, reporting the first bad entry.
#[cfg(test)]
pub fn parse_slots<S: AsRef<str>>(raw: &[S]) -> Result<BTreeSet<TimeSlot>, String> {
    raw.iter().map(|s| s.as_ref().parse()).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Coach profile
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    #[serde(default)]
    pub issued_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub credential_id: Option<String>,
}

impl Certification {
    #[cfg(test)]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            issued_date: None,
            expiry_date: None,
            credential_id: None,
        }
    }

    /// A certification without an expiry date never lapses.
    pub fn is_current(&self, on: NaiveDate) -> bool {
        self.expiry_date.map_or(true, |expiry| expiry >= on)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementSignals {
    /// Fraction of optional profile fields populated, 0.0 – 1.0. Derived when absent.
    #[serde(default)]
    pub profile_completeness: Option<f64>,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verified_video_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachProfile {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub location: Location,
    pub role_type: RoleType,
    pub years_experience: u32,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub available_times: BTreeSet<TimeSlot>,
    #[serde(default)]
    pub lifestyle_tags: BTreeSet<String>,
    #[serde(default)]
    pub movement_tags: BTreeSet<String>,
    #[serde(default)]
    pub instruction_tags: BTreeSet<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    #[serde(flatten)]
    pub engagement: EngagementSignals,
    pub updated_at: DateTime<Utc>,
}

impl CoachProfile {
    /// Union of lifestyle, movement and instruction tags.
    pub fn all_tags(&self) -> impl Iterator<Item = &String> {
        self.lifestyle_tags
            .iter()
            .chain(self.movement_tags.iter())
            .chain(self.instruction_tags.iter())
    }

    pub fn has_any_tags(&self) -> bool {
        self.all_tags().next().is_some()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Job posting
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationType {
    Hourly,
    Salary,
    PerClass,
}

impl FromStr for CompensationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "hourly" => Ok(CompensationType::Hourly),
            "salary" => Ok(CompensationType::Salary),
            "per_class" => Ok(CompensationType::PerClass),
            other => Err(format!("unknown compensation type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    #[serde(rename = "compensation_type", default)]
    pub kind: Option<CompensationType>,
    pub min: f64,
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Open,
    Filled,
    Closed,
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "draft" => Ok(JobStatus::Draft),
            "open" => Ok(JobStatus::Open),
            "filled" => Ok(JobStatus::Filled),
            "closed" => Ok(JobStatus::Closed),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

pub const DEFAULT_PRESET: &str = "balanced";
pub const DEFAULT_THRESHOLD: f64 = 0.60;

fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub role_type: RoleType,
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub min_experience: u32,
    #[serde(default)]
    pub required_certifications: BTreeSet<String>,
    #[serde(default)]
    pub preferred_certifications: BTreeSet<String>,
    #[serde(default)]
    pub required_availability: BTreeSet<TimeSlot>,
    #[serde(default)]
    pub culture_tags: BTreeSet<String>,
    #[serde(default)]
    pub compensation: Option<Compensation>,
    #[serde(default = "default_preset")]
    pub weighting_preset: String,
    #[serde(default = "default_threshold")]
    pub fitscore_threshold: f64,
    pub status: JobStatus,
    pub updated_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Score breakdown
// ────────────────────────────────────────────────────────────────────────────

/// The six independently computed FitScore components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Certification,
    Experience,
    Availability,
    Location,
    Culture,
    Engagement,
}

impl Component {
    pub const ALL: [Component; 6] = [
        Component::Certification,
        Component::Experience,
        Component::Availability,
        Component::Location,
        Component::Culture,
        Component::Engagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Certification => "certification",
            Component::Experience => "experience",
            Component::Availability => "availability",
            Component::Location => "location",
            Component::Culture => "culture",
            Component::Engagement => "engagement",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FitScoreBreakdown {
    pub certification_score: f64,
    pub experience_score: f64,
    pub availability_score: f64,
    pub location_score: f64,
    pub culture_score: f64,
    pub engagement_score: f64,
}

impl FitScoreBreakdown {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Certification => self.certification_score,
            Component::Experience => self.experience_score,
            Component::Availability => self.availability_score,
            Component::Location => self.location_score,
            Component::Culture => self.culture_score,
            Component::Engagement => self.engagement_score,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Component, f64)> + '_ {
        Component::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// Total FitScore together with the components it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredPair {
    pub fitscore: f64,
    pub fitscore_breakdown: FitScoreBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_has_21_distinct_slots() {
        let slots: BTreeSet<TimeSlot> = TimeSlot::grid().collect();
        assert_eq!(slots.len(), 21);
    }

    #[test]
    fn test_time_slot_wire_format() {
        let slot: TimeSlot = "Sat Evening".parse().unwrap();
        assert_eq!(slot, TimeSlot::new(Day::Sat, DayPeriod::Evening));
        assert_eq!(slot.to_string(), "Sat Evening");
        assert_eq!(serde_json::to_string(&slot).unwrap(), "\"Sat Evening\"");
    }

    #[test]
    fn test_time_slot_rejects_unknown() {
        assert!("Funday AM".parse::<TimeSlot>().is_err());
        assert!("Mon Night".parse::<TimeSlot>().is_err());
        assert!("Mon".parse::<TimeSlot>().is_err());
        assert!("Mon AM extra".parse::<TimeSlot>().is_err());
        assert!(serde_json::from_str::<TimeSlot>("\"Mon Noon\"").is_err());
    }

    #[test]
    fn test_parse_slots_deduplicates() {
        let slots = parse_slots(&["Mon AM", "mon am", "Fri PM"]).unwrap();
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn test_role_type_round_trips_through_wire_name() {
        let role: RoleType = "Yoga Instructor".parse().unwrap();
        assert_eq!(role, RoleType::YogaInstructor);
        assert_eq!(
            serde_json::to_value(role).unwrap(),
            serde_json::json!("Yoga Instructor")
        );
        assert!("Spin Coach".parse::<RoleType>().is_err());
    }

    #[test]
    fn test_certification_expiry() {
        let cert = Certification {
            expiry_date: NaiveDate::from_ymd_opt(2025, 6, 30),
            ..Certification::named("ACE")
        };
        assert!(cert.is_current(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()));
        assert!(!cert.is_current(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()));
        assert!(Certification::named("ACE").is_current(NaiveDate::MAX));
    }

    #[test]
    fn test_job_defaults_from_minimal_json() {
        let job: JobPosting = serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "Morning Yoga Lead",
            "role_type": "Yoga Instructor",
            "city": "Austin",
            "state": "TX",
            "status": "open",
            "updated_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(job.weighting_preset, "balanced");
        assert_eq!(job.fitscore_threshold, 0.60);
        assert!(job.required_availability.is_empty());
        assert_eq!(job.location.city, "Austin");
    }

    #[test]
    fn test_breakdown_iterates_all_components() {
        let b = FitScoreBreakdown {
            culture_score: 0.5,
            ..Default::default()
        };
        let items: Vec<_> = b.iter().collect();
        assert_eq!(items.len(), 6);
        assert_eq!(items[4], (Component::Culture, 0.5));
    }
}
