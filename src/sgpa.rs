use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::grade_scale;
use crate::models::{SemesterResult, SubjectMarks, SubjectRecord};

pub const GPA_DECIMALS: i32 = 3;
pub const MAX_SEMESTER: u8 = 8;
pub const MID_MAX: f64 = 40.0;
pub const PRESENTATION_MAX: f64 = 10.0;
pub const CIE_MAX: f64 = 50.0;
pub const SEE_MAX: f64 = 50.0;
pub const TOTAL_MAX: f64 = 100.0;
pub const MAX_SUBJECT_CREDITS: u32 = 10;

/// Rounds half away from zero at `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round_gpa(value: f64) -> f64 {
    round_to(value, GPA_DECIMALS)
}

fn check_mark(subject: &str, field: &str, value: f64, max: f64) -> EngineResult<()> {
    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidScore(format!(
            "{subject}: {field} {value} is outside 0..={max}"
        )))
    }
}

/// Rejects marks outside their assessment ranges, and non-finite marks.
pub fn validate_marks(marks: &SubjectMarks) -> EngineResult<()> {
    check_mark(&marks.name, "mid1", marks.mid1, MID_MAX)?;
    check_mark(&marks.name, "mid2", marks.mid2, MID_MAX)?;
    check_mark(&marks.name, "presentation", marks.presentation, PRESENTATION_MAX)?;
    check_mark(&marks.name, "see", marks.final_exam, SEE_MAX)?;
    if marks.credits > MAX_SUBJECT_CREDITS {
        return Err(EngineError::InvalidInput(format!(
            "{}: {} credits exceeds {MAX_SUBJECT_CREDITS}",
            marks.name, marks.credits
        )));
    }
    Ok(())
}

/// Derives the assessment totals and grade for one subject.
pub fn grade_subject(marks: &SubjectMarks) -> EngineResult<SubjectRecord> {
    validate_marks(marks)?;

    let average_mid = (marks.mid1 + marks.mid2) / 2.0;
    let continuous_assessment = (average_mid + marks.presentation).min(CIE_MAX);
    let final_exam = marks.final_exam;
    let total_score = (continuous_assessment + final_exam).min(TOTAL_MAX);
    let grade = grade_scale::lookup(total_score)?;
    debug!(subject = %marks.name, total_score, grade = grade.label, "graded subject");

    Ok(SubjectRecord {
        name: marks.name.clone(),
        credits: marks.credits,
        mid1: marks.mid1,
        mid2: marks.mid2,
        average_mid,
        presentation: marks.presentation,
        continuous_assessment,
        final_exam,
        total_score,
        grade,
    })
}

/// Computes a semester's SGPA. Any invalid subject fails the whole semester.
///
/// The SGPA is `None` when the subjects carry no credits.
pub fn compute(semester: u8, subjects: &[SubjectMarks]) -> EngineResult<SemesterResult> {
    if !(1..=MAX_SEMESTER).contains(&semester) {
        return Err(EngineError::InvalidInput(format!(
            "semester {semester} is outside 1..={MAX_SEMESTER}"
        )));
    }

    let records = subjects
        .iter()
        .map(grade_subject)
        .collect::<EngineResult<Vec<SubjectRecord>>>()?;

    let mut weighted = 0.0;
    let mut total_credits = 0u32;
    for record in &records {
        weighted += record.grade.points * f64::from(record.credits);
        total_credits = total_credits.checked_add(record.credits).ok_or_else(|| {
            EngineError::InvalidInput(format!("semester {semester} credit total overflows"))
        })?;
    }

    let sgpa = if total_credits == 0 {
        None
    } else {
        Some(round_gpa(weighted / f64::from(total_credits)))
    };

    Ok(SemesterResult {
        semester,
        subjects: records,
        sgpa,
        total_credits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(name: &str, credits: u32, mid1: f64, mid2: f64, presentation: f64, see: f64) -> SubjectMarks {
        SubjectMarks {
            name: name.to_string(),
            credits,
            mid1,
            mid2,
            presentation,
            final_exam: see,
        }
    }

    #[test]
    fn subject_totals_follow_assessment_formula() {
        let record = grade_subject(&marks("Compilers", 4, 30.0, 34.0, 8.0, 45.0)).expect("valid marks");
        assert_eq!(record.average_mid, 32.0);
        assert_eq!(record.continuous_assessment, 40.0);
        assert_eq!(record.final_exam, 45.0);
        assert_eq!(record.total_score, 85.0);
        assert_eq!(record.grade.label, "A+");
        assert_eq!(record.grade.points, 9.0);
    }

    #[test]
    fn full_marks_reach_the_top_band() {
        let record = grade_subject(&marks("Perfect", 3, 40.0, 40.0, 10.0, 50.0)).expect("valid marks");
        assert_eq!(record.continuous_assessment, 50.0);
        assert_eq!(record.total_score, 100.0);
        assert_eq!(record.grade.label, "O");
    }

    #[test]
    fn sgpa_is_credit_weighted_and_rounded() {
        let subjects = vec![
            marks("Compilers", 4, 30.0, 34.0, 8.0, 45.0),
            marks("Networks", 3, 20.0, 20.0, 5.0, 25.0),
        ];
        let result = compute(2, &subjects).expect("valid semester");
        assert_eq!(result.total_credits, 7);
        // (9*4 + 6*3) / 7 = 7.714285...
        assert_eq!(result.sgpa, Some(7.714));
    }

    #[test]
    fn zero_credits_leave_sgpa_undefined() {
        let subjects = vec![marks("Seminar", 0, 30.0, 30.0, 10.0, 50.0)];
        let result = compute(1, &subjects).expect("valid semester");
        assert_eq!(result.sgpa, None);
        assert_eq!(result.total_credits, 0);

        let empty = compute(1, &[]).expect("valid semester");
        assert_eq!(empty.sgpa, None);
    }

    #[test]
    fn non_finite_marks_are_invalid_scores() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let subjects = vec![
                marks("Compilers", 4, 30.0, 34.0, 8.0, 45.0),
                marks("Garbage", 4, bad, 0.0, 0.0, 20.0),
            ];
            assert!(matches!(compute(1, &subjects), Err(EngineError::InvalidScore(_))));

            let subjects = vec![marks("Garbage", 4, 20.0, 20.0, 5.0, bad)];
            assert!(matches!(compute(1, &subjects), Err(EngineError::InvalidScore(_))));
        }
    }

    #[test]
    fn each_mark_is_bounded() {
        let cases = [
            marks("Mid1 high", 4, 40.5, 20.0, 5.0, 25.0),
            marks("Mid1 low", 4, -1.0, 20.0, 5.0, 25.0),
            marks("Mid2 high", 4, 20.0, 400.0, 5.0, 25.0),
            marks("Presentation high", 4, 20.0, 20.0, 10.5, 25.0),
            marks("Presentation low", 4, 20.0, 20.0, -0.5, 25.0),
            marks("SEE high", 4, 20.0, 20.0, 5.0, 51.0),
            marks("SEE low", 4, 40.0, 40.0, 10.0, -20.0),
        ];
        for subject in cases {
            let err = compute(1, std::slice::from_ref(&subject)).expect_err("out of range");
            match err {
                EngineError::InvalidScore(message) => {
                    assert!(message.starts_with(&subject.name), "{message}")
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn subject_credits_are_capped() {
        let subjects = vec![marks("Capstone", 11, 30.0, 30.0, 8.0, 40.0)];
        assert!(matches!(compute(1, &subjects), Err(EngineError::InvalidInput(_))));

        let huge = vec![
            marks("A", u32::MAX, 30.0, 30.0, 8.0, 40.0),
            marks("B", u32::MAX, 30.0, 30.0, 8.0, 40.0),
        ];
        assert!(matches!(compute(1, &huge), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn failing_subjects_still_count_as_zero_points() {
        let subjects = vec![
            marks("Compilers", 4, 30.0, 34.0, 8.0, 45.0),
            marks("Physics", 4, 10.0, 10.0, 0.0, 10.0),
        ];
        let result = compute(1, &subjects).expect("valid semester");
        assert_eq!(result.total_credits, 8);
        assert_eq!(result.sgpa, Some(4.5));
    }

    #[test]
    fn semester_number_must_be_in_range() {
        assert!(matches!(compute(0, &[]), Err(EngineError::InvalidInput(_))));
        assert!(matches!(compute(9, &[]), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn rounding_is_half_away_from_zero_and_stable() {
        assert_eq!(round_gpa(1.0625), 1.063);
        assert_eq!(round_gpa(8.5454545), 8.545);
        assert_eq!(round_gpa(round_gpa(7.7142857)), round_gpa(7.7142857));
    }
}
