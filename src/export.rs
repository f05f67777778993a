use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use serde::Serialize;

use crate::models::{CumulativeResult, HistoryEntry, SemesterResult, SubjectMarks};
use crate::sgpa::round_to;

pub fn read_subjects_csv(csv_path: &Path) -> anyhow::Result<Vec<SubjectMarks>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut subjects = Vec::new();

    for (index, result) in reader.deserialize::<SubjectMarks>().enumerate() {
        let row = result.with_context(|| {
            format!("invalid subject row {} in {}", index + 1, csv_path.display())
        })?;
        subjects.push(row);
    }

    Ok(subjects)
}

/// Export file name: `<student>_<label>_<YYYYMMDD_HHMMSS>.<ext>` without spaces.
pub fn export_file_name(student: Option<&str>, label: &str, extension: &str) -> String {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}_{}.{}", student.unwrap_or("student"), label, stamp, extension).replace(' ', "_")
}

pub fn write_semester_csv(path: &Path, result: &SemesterResult) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct SubjectRow<'a> {
        #[serde(rename = "Subject")]
        subject: &'a str,
        #[serde(rename = "Credits")]
        credits: u32,
        #[serde(rename = "Mid1_out_of_40")]
        mid1: f64,
        #[serde(rename = "Mid2_out_of_40")]
        mid2: f64,
        #[serde(rename = "Avg_mid_out_of_40")]
        average_mid: f64,
        #[serde(rename = "Presentation_out_of_10")]
        presentation: f64,
        #[serde(rename = "CIE_out_of_50")]
        continuous_assessment: f64,
        #[serde(rename = "SEE_out_of_50")]
        final_exam: f64,
        #[serde(rename = "Total_out_of_100")]
        total: f64,
        #[serde(rename = "Grade")]
        grade: &'a str,
        #[serde(rename = "Grade_Point")]
        grade_point: f64,
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for record in &result.subjects {
        writer.serialize(SubjectRow {
            subject: &record.name,
            credits: record.credits,
            mid1: record.mid1,
            mid2: record.mid2,
            average_mid: round_to(record.average_mid, 2),
            presentation: record.presentation,
            continuous_assessment: round_to(record.continuous_assessment, 2),
            final_exam: round_to(record.final_exam, 2),
            total: round_to(record.total_score, 2),
            grade: record.grade.label,
            grade_point: record.grade.points,
        })?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_cumulative_csv(path: &Path, student: Option<&str>, result: &CumulativeResult) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct CumulativeRow<'a> {
        semester: Option<u8>,
        sgpa: f64,
        credits: u32,
        student: &'a str,
        cgpa: f64,
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for pair in &result.counted {
        writer.serialize(CumulativeRow {
            semester: pair.semester,
            sgpa: pair.sgpa,
            credits: pair.credits,
            student: student.unwrap_or(""),
            cgpa: result.cgpa,
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// One row per ledger entry; action-specific fields go into a JSON `details` column.
pub fn write_history_csv(path: &Path, entries: &[HistoryEntry]) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct HistoryRow<'a> {
        timestamp: &'a str,
        student: &'a str,
        hallticket: &'a str,
        program: &'a str,
        action: &'static str,
        rating: Option<u8>,
        details: String,
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for entry in entries {
        let mut details = serde_json::to_value(&entry.action)?;
        if let Some(map) = details.as_object_mut() {
            map.remove("action");
        }
        writer.serialize(HistoryRow {
            timestamp: &entry.timestamp,
            student: entry.actor.student.as_deref().unwrap_or(""),
            hallticket: entry.actor.hallticket.as_deref().unwrap_or(""),
            program: entry.actor.program.as_deref().unwrap_or(""),
            action: entry.action.kind(),
            rating: entry.rating.map(u8::from),
            details: details.to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Deletes exported CSV and markdown files in `dir`. Returns the removed paths.
pub fn purge_exports(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    if !dir.exists() {
        return Ok(removed);
    }

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_export = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext, "csv" | "md"))
            .unwrap_or(false);
        if path.is_file() && is_export {
            std::fs::remove_file(&path)
                .with_context(|| format!("failed to delete {}", path.display()))?;
            removed.push(path);
        }
    }

    Ok(removed)
}
