use std::fmt::Write;

use crate::ledger;
use crate::models::{Actor, HistoryEntry, SemesterResult};

pub fn build_semester_report(actor: &Actor, result: &SemesterResult, generated_at: &str) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# GPA Report");
    let _ = writeln!(
        output,
        "Student: {} | Hallticket: {} | Program: {}",
        actor.student.as_deref().unwrap_or("-"),
        actor.hallticket.as_deref().unwrap_or("-"),
        actor.program.as_deref().unwrap_or("-")
    );
    match result.sgpa {
        Some(sgpa) => {
            let _ = writeln!(
                output,
                "Semester {}: SGPA {:.3} over {} credits",
                result.semester, sgpa, result.total_credits
            );
        }
        None => {
            let _ = writeln!(output, "Semester {}: SGPA undefined (no credits)", result.semester);
        }
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Subjects");

    if result.subjects.is_empty() {
        let _ = writeln!(output, "No subjects recorded for this semester.");
    } else {
        let _ = writeln!(output, "| Subject | Credits | CIE | SEE | Total | Grade |");
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        for subject in &result.subjects {
            let _ = writeln!(
                output,
                "| {} | {} | {:.2} | {:.2} | {:.2} | {} ({}) |",
                subject.name,
                subject.credits,
                subject.continuous_assessment,
                subject.final_exam,
                subject.total_score,
                subject.grade.label,
                subject.grade.points
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Generated: {generated_at}");
    output
}

pub fn build_history_report(entries: &[HistoryEntry]) -> String {
    let summary = ledger::summarize(entries);
    let mut output = String::new();

    let _ = writeln!(output, "# Calci History Report");
    let _ = writeln!(output, "{} entries recorded", summary.entry_count);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Activity Mix");

    if summary.by_action.is_empty() {
        let _ = writeln!(output, "No history entries yet.");
    } else {
        for action in &summary.by_action {
            let _ = writeln!(output, "- {}: {} entries", action.kind, action.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Ratings");
    match summary.average_rating {
        Some(average) => {
            let _ = writeln!(
                output,
                "Average rating {:.2} / 5 across {} ratings",
                average, summary.rating_count
            );
        }
        None => {
            let _ = writeln!(output, "No ratings recorded yet.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Activity");

    if entries.is_empty() {
        let _ = writeln!(output, "No history entries yet.");
    } else {
        for entry in entries.iter().rev().take(10) {
            let _ = writeln!(
                output,
                "- {} {} by {}",
                entry.timestamp,
                entry.action.kind(),
                entry.actor.student.as_deref().unwrap_or("anonymous")
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Rating, SubjectMarks};
    use crate::sgpa;

    #[test]
    fn semester_report_lists_subjects_and_sgpa() {
        let subjects = vec![SubjectMarks {
            name: "Compilers".to_string(),
            credits: 4,
            mid1: 30.0,
            mid2: 34.0,
            presentation: 8.0,
            final_exam: 45.0,
        }];
        let result = sgpa::compute(4, &subjects).expect("valid semester");
        let actor = Actor {
            student: Some("Kiara Patel".to_string()),
            hallticket: None,
            program: Some("B.Tech".to_string()),
        };

        let report = build_semester_report(&actor, &result, "2025-05-01 10:00:00");
        assert!(report.contains("Student: Kiara Patel | Hallticket: - | Program: B.Tech"));
        assert!(report.contains("Semester 4: SGPA 9.000 over 4 credits"));
        assert!(report.contains("| Compilers | 4 | 40.00 | 45.00 | 85.00 | A+ (9) |"));
    }

    #[test]
    fn semester_report_marks_undefined_sgpa() {
        let result = sgpa::compute(2, &[]).expect("valid semester");
        let report = build_semester_report(&Actor::default(), &result, "now");
        assert!(report.contains("SGPA undefined"));
        assert!(report.contains("No subjects recorded"));
    }

    #[test]
    fn history_report_shows_average_rating() {
        let entries = vec![
            HistoryEntry {
                timestamp: "2025-05-01 10:00:00".to_string(),
                actor: Actor::default(),
                action: Action::AppRating {
                    feedback: String::new(),
                },
                rating: Some(Rating::try_from(4).expect("valid rating")),
            },
            HistoryEntry {
                timestamp: "2025-05-01 11:00:00".to_string(),
                actor: Actor::default(),
                action: Action::CountryConversion { cgpa: 8.1 },
                rating: None,
            },
        ];

        let report = build_history_report(&entries);
        assert!(report.contains("2 entries recorded"));
        assert!(report.contains("Average rating 4.00 / 5 across 1 ratings"));
        assert!(report.contains("- app-rating: 1 entries"));
        assert!(report.contains("2025-05-01 11:00:00 country-conversion by anonymous"));
    }

    #[test]
    fn empty_history_report_says_so() {
        let report = build_history_report(&[]);
        assert!(report.contains("No ratings recorded yet."));
        assert!(report.contains("No history entries yet."));
    }
}
