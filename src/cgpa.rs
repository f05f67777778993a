use crate::error::{EngineError, EngineResult};
use crate::models::{CumulativeResult, SemesterCredits};
use crate::sgpa::round_gpa;

pub const MAX_SEMESTER_CREDITS: u32 = 80;

/// Credit-weights semester SGPAs into a CGPA.
///
/// Pairs with a non-positive SGPA are semesters not yet completed and are
/// skipped rather than averaged in as zero.
pub fn compute(pairs: &[SemesterCredits]) -> EngineResult<CumulativeResult> {
    let counted: Vec<SemesterCredits> = pairs.iter().copied().filter(|pair| pair.sgpa > 0.0).collect();
    let total_credits = counted
        .iter()
        .try_fold(0u32, |total, pair| total.checked_add(pair.credits))
        .ok_or_else(|| EngineError::InvalidInput("cumulative credit total overflows".to_string()))?;

    if total_credits == 0 {
        return Err(EngineError::NoCredits);
    }

    let weighted: f64 = counted
        .iter()
        .map(|pair| pair.sgpa * f64::from(pair.credits))
        .sum();

    Ok(CumulativeResult {
        cgpa: round_gpa(weighted / f64::from(total_credits)),
        total_credits,
        counted,
    })
}

/// Parses a `SGPA:CREDITS` pair as typed on the command line.
pub fn parse_pair(raw: &str) -> EngineResult<SemesterCredits> {
    let (sgpa, credits) = raw
        .split_once(':')
        .ok_or_else(|| EngineError::InvalidInput(format!("'{raw}' is not SGPA:CREDITS")))?;
    let sgpa: f64 = sgpa
        .trim()
        .parse()
        .map_err(|_| EngineError::InvalidInput(format!("'{sgpa}' is not a valid SGPA")))?;
    if !sgpa.is_finite() || !(0.0..=10.0).contains(&sgpa) {
        return Err(EngineError::InvalidInput(format!("SGPA {sgpa} is outside 0..=10")));
    }
    let credits: u32 = credits
        .trim()
        .parse()
        .map_err(|_| EngineError::InvalidInput(format!("'{credits}' is not a credit count")))?;
    if credits > MAX_SEMESTER_CREDITS {
        return Err(EngineError::InvalidInput(format!(
            "{credits} credits exceeds {MAX_SEMESTER_CREDITS} per semester"
        )));
    }

    Ok(SemesterCredits {
        semester: None,
        sgpa,
        credits,
    })
}
