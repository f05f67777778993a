use crate::error::{EngineError, EngineResult};
use crate::grade_scale;
use crate::models::{Difficulty, PlanItem, PlanRequirement};

/// Points available in the single remaining assessment.
pub const MAX_REMAINING: f64 = 50.0;

/// Minimum remaining-assessment score needed to reach `target_grade_points`.
///
/// Zero means the partial score already meets the target.
pub fn required_remaining(
    current_partial_score: f64,
    target_grade_points: f64,
) -> EngineResult<PlanRequirement> {
    if !current_partial_score.is_finite() || !(0.0..=MAX_REMAINING).contains(&current_partial_score) {
        return Err(EngineError::InvalidScore(format!(
            "partial score {current_partial_score} is outside 0..={MAX_REMAINING}"
        )));
    }

    let lower_bound = grade_scale::lower_bound_for(target_grade_points)?;
    let required_remaining = (lower_bound - current_partial_score).clamp(0.0, MAX_REMAINING);

    Ok(PlanRequirement {
        current_partial_score,
        target_grade_points,
        required_remaining,
    })
}

impl Difficulty {
    pub fn steps(self) -> &'static [&'static str] {
        match self {
            Difficulty::Easy => &[
                "Revise lecture notes (2 sessions of 1 hour)",
                "Practice 10 MCQs and 2 previous year problems",
                "Quick concept map and 30 minutes of flashcards",
            ],
            Difficulty::Moderate => &[
                "Detailed notes and 3 practice problems",
                "Timed mock test (40 minutes) and review mistakes",
                "Group study session (60 minutes) on weak topics",
            ],
            Difficulty::Hard => &[
                "Deep dive: textbook chapters and worked examples",
                "Daily problem set (5 problems) for 7 days",
                "One-on-one coaching or peer tutoring",
            ],
        }
    }
}

pub fn study_plan(subjects: &[(String, Difficulty)]) -> Vec<PlanItem> {
    subjects
        .iter()
        .map(|(subject, difficulty)| PlanItem {
            subject: subject.clone(),
            difficulty: *difficulty,
            steps: difficulty.steps().iter().map(|step| step.to_string()).collect(),
        })
        .collect()
}

/// Parses `NAME:DIFFICULTY`, defaulting to moderate when no difficulty is given.
pub fn parse_plan_subject(raw: &str) -> EngineResult<(String, Difficulty)> {
    match raw.rsplit_once(':') {
        Some((name, difficulty)) => Ok((name.trim().to_string(), difficulty.parse()?)),
        None => Ok((raw.trim().to_string(), Difficulty::Moderate)),
    }
}
