use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One row of the fixed percentage-to-grade table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeBand {
    pub min_percent: f64,
    pub max_percent: f64,
    pub label: &'static str,
    pub points: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Grade {
    pub label: &'static str,
    pub points: f64,
}

/// Raw marks for one subject as entered by the student.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubjectMarks {
    #[serde(rename = "subject")]
    pub name: String,
    pub credits: u32,
    /// Out of 40.
    pub mid1: f64,
    /// Out of 40.
    pub mid2: f64,
    /// Presentation or assignment, out of 10.
    pub presentation: f64,
    /// Semester end exam, out of 50.
    #[serde(rename = "see")]
    pub final_exam: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRecord {
    pub name: String,
    pub credits: u32,
    pub mid1: f64,
    pub mid2: f64,
    pub average_mid: f64,
    pub presentation: f64,
    pub continuous_assessment: f64,
    pub final_exam: f64,
    pub total_score: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemesterResult {
    pub semester: u8,
    pub subjects: Vec<SubjectRecord>,
    /// Undefined when the subjects carry no credits.
    pub sgpa: Option<f64>,
    pub total_credits: u32,
}

/// A `(sgpa, credits)` pair fed into the cumulative average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SemesterCredits {
    pub semester: Option<u8>,
    pub sgpa: f64,
    pub credits: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeResult {
    pub cgpa: f64,
    pub total_credits: u32,
    /// The pairs that took part in the weighting.
    pub counted: Vec<SemesterCredits>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "United States")]
    UnitedStates,
    Canada,
    #[serde(rename = "United Kingdom")]
    UnitedKingdom,
    Germany,
    Australia,
    Netherlands,
    Sweden,
    France,
    Singapore,
    #[serde(rename = "New Zealand")]
    NewZealand,
}

impl Country {
    pub const ALL: [Country; 10] = [
        Country::UnitedStates,
        Country::Canada,
        Country::UnitedKingdom,
        Country::Germany,
        Country::Australia,
        Country::Netherlands,
        Country::Sweden,
        Country::France,
        Country::Singapore,
        Country::NewZealand,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Country::UnitedStates => "United States",
            Country::Canada => "Canada",
            Country::UnitedKingdom => "United Kingdom",
            Country::Germany => "Germany",
            Country::Australia => "Australia",
            Country::Netherlands => "Netherlands",
            Country::Sweden => "Sweden",
            Country::France => "France",
            Country::Singapore => "Singapore",
            Country::NewZealand => "New Zealand",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Country {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Country::ALL
            .into_iter()
            .find(|country| country.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EngineError::InvalidInput(format!("unsupported country '{wanted}'")))
    }
}

/// Country-specific shape of a converted grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CountryPayload {
    LinearScale { scale: String, value: f64 },
    Classification { label: String },
    SteppedScale { scale: String, value: f64 },
    RawPercent { value: f64 },
}

impl fmt::Display for CountryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountryPayload::LinearScale { scale, value }
            | CountryPayload::SteppedScale { scale, value } => {
                write!(f, "{value} (scale {scale})")
            }
            CountryPayload::Classification { label } => f.write_str(label),
            CountryPayload::RawPercent { value } => write!(f, "{value}%"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanRequirement {
    pub current_partial_score: f64,
    pub target_grade_points: f64,
    pub required_remaining: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

impl std::str::FromStr for Difficulty {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "moderate" => Ok(Difficulty::Moderate),
            "hard" => Ok(Difficulty::Hard),
            other => Err(EngineError::InvalidInput(format!(
                "unknown difficulty '{other}' (expected easy, moderate or hard)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub subject: String,
    pub difficulty: Difficulty,
    pub steps: Vec<String>,
}

/// A usefulness rating between 1 and 5 stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=5).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(EngineError::InvalidInput(format!(
                "rating {value} is outside 1..=5"
            )))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

/// Who performed an action. All fields are optional; the ledger does not verify identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default)]
    pub student: Option<String>,
    #[serde(default)]
    pub hallticket: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    GradeLookup {
        percent: f64,
        label: String,
        points: f64,
    },
    SemesterComputation {
        semester: u8,
        sgpa: f64,
        total_credits: u32,
        subject_count: usize,
        #[serde(default)]
        exports: Vec<String>,
    },
    CgpaComputation {
        cgpa: f64,
        total_credits: u32,
        semesters_counted: usize,
    },
    CountryConversion {
        cgpa: f64,
    },
    PlannerRun {
        current_partial_score: f64,
        target_grade_points: f64,
        required_remaining: f64,
        #[serde(default)]
        plan_items: Vec<PlanItem>,
    },
    AppRating {
        #[serde(default)]
        feedback: String,
    },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::GradeLookup { .. } => "grade-lookup",
            Action::SemesterComputation { .. } => "semester-computation",
            Action::CgpaComputation { .. } => "cgpa-computation",
            Action::CountryConversion { .. } => "country-conversion",
            Action::PlannerRun { .. } => "planner-run",
            Action::AppRating { .. } => "app-rating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    #[serde(flatten)]
    pub actor: Actor,
    #[serde(flatten)]
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionSummary {
    pub kind: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSummary {
    pub entry_count: usize,
    pub rating_count: usize,
    pub average_rating: Option<f64>,
    pub by_action: Vec<ActionSummary>,
}
