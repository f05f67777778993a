use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Action, ActionSummary, Actor, HistoryEntry, LedgerSummary, Rating, SemesterCredits,
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

impl HistoryEntry {
    pub fn new(actor: Actor, action: Action, rating: Option<Rating>) -> Self {
        Self {
            timestamp: now_timestamp(),
            actor,
            action,
            rating,
        }
    }
}

/// Append-only JSON ledger of every computation and rating.
///
/// The whole record list is read and rewritten on each mutation, which is
/// fine for the low write volume of a single user. Writes go to a temporary
/// sibling file that is renamed over the ledger, so an interrupted write
/// never leaves a half-written ledger behind. There is no locking; one
/// writer at a time is assumed.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    path: PathBuf,
}

impl HistoryLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: HistoryEntry) -> EngineResult<()> {
        let mut entries = self.read_all()?;
        debug!(action = entry.action.kind(), position = entries.len(), "appending ledger entry");
        entries.push(entry);
        self.write_all(&entries)
    }

    /// All entries in append order. A missing ledger reads as empty.
    pub fn read_all(&self) -> EngineResult<Vec<HistoryEntry>> {
        if !self.path.exists() {
            debug!("No ledger found at {:?}", self.path);
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|source| EngineError::LedgerCorruption {
            path: self.path.clone(),
            source,
        })
    }

    pub fn reset_all(&self) -> EngineResult<()> {
        self.write_all(&[])?;
        info!("Ledger at {:?} reset", self.path);
        Ok(())
    }

    /// Sibling of the ledger with `.tmp` appended to the full file name.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_all(&self, entries: &[HistoryEntry]) -> EngineResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.temp_path();
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, entries).map_err(std::io::Error::from)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!("Saved ledger with {} entries", entries.len());
        Ok(())
    }
}

pub fn average_rating(entries: &[HistoryEntry]) -> Option<f64> {
    let ratings: Vec<u8> = entries
        .iter()
        .filter_map(|entry| entry.rating.map(Rating::value))
        .collect();

    if ratings.is_empty() {
        None
    } else {
        let total: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
        Some(f64::from(total) / ratings.len() as f64)
    }
}

pub fn summarize(entries: &[HistoryEntry]) -> LedgerSummary {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.action.kind()).or_insert(0) += 1;
    }

    let mut by_action: Vec<ActionSummary> = counts
        .into_iter()
        .map(|(kind, count)| ActionSummary { kind, count })
        .collect();
    by_action.sort_by(|a, b| b.count.cmp(&a.count));

    LedgerSummary {
        entry_count: entries.len(),
        rating_count: entries.iter().filter(|entry| entry.rating.is_some()).count(),
        average_rating: average_rating(entries),
        by_action,
    }
}

/// Latest recorded SGPA per semester for one hallticket, ready for CGPA weighting.
pub fn semester_credits_for(entries: &[HistoryEntry], hallticket: &str) -> Vec<SemesterCredits> {
    let mut latest: BTreeMap<u8, SemesterCredits> = BTreeMap::new();

    for entry in entries {
        if entry.actor.hallticket.as_deref() != Some(hallticket) {
            continue;
        }
        if let Action::SemesterComputation {
            semester,
            sgpa,
            total_credits,
            ..
        } = &entry.action
        {
            latest.insert(
                *semester,
                SemesterCredits {
                    semester: Some(*semester),
                    sgpa: *sgpa,
                    credits: *total_credits,
                },
            );
        }
    }

    latest.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(hallticket: &str) -> Actor {
        Actor {
            student: Some("Avery Lee".to_string()),
            hallticket: Some(hallticket.to_string()),
            program: Some("B.Tech".to_string()),
        }
    }

    fn semester_entry(hallticket: &str, semester: u8, sgpa: f64, credits: u32) -> HistoryEntry {
        HistoryEntry::new(
            actor(hallticket),
            Action::SemesterComputation {
                semester,
                sgpa,
                total_credits: credits,
                subject_count: 6,
                exports: Vec::new(),
            },
            None,
        )
    }

    fn rating_entry(stars: u8) -> HistoryEntry {
        HistoryEntry::new(
            Actor::default(),
            Action::AppRating {
                feedback: String::new(),
            },
            Some(Rating::try_from(stars).expect("valid rating")),
        )
    }

    #[test]
    fn missing_ledger_reads_as_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ledger = HistoryLedger::new(dir.path().join("history.json"));
        assert!(ledger.read_all().expect("readable").is_empty());
    }

    #[test]
    fn append_preserves_order_and_reads_are_stable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ledger = HistoryLedger::new(dir.path().join("results").join("history.json"));

        let first = semester_entry("25EU08R0111", 1, 8.2, 22);
        let second = rating_entry(4);
        let third = semester_entry("25EU08R0111", 2, 7.9, 24);
        ledger.append(first.clone()).expect("append");
        ledger.append(second.clone()).expect("append");
        ledger.append(third.clone()).expect("append");

        let read = ledger.read_all().expect("readable");
        assert_eq!(read, vec![first, second, third]);
        assert_eq!(ledger.read_all().expect("readable"), read);
        assert!(!ledger.temp_path().exists());
    }

    #[test]
    fn ledger_named_with_tmp_extension_survives_writes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ledger = HistoryLedger::new(dir.path().join("history.tmp"));
        assert_eq!(ledger.temp_path(), dir.path().join("history.tmp.tmp"));

        ledger.append(rating_entry(3)).expect("append");
        ledger.append(rating_entry(4)).expect("append");
        assert_eq!(ledger.read_all().expect("readable").len(), 2);
        assert!(!ledger.temp_path().exists());
    }

    #[test]
    fn reset_clears_everything() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ledger = HistoryLedger::new(dir.path().join("history.json"));
        ledger.append(rating_entry(5)).expect("append");
        ledger.reset_all().expect("reset");
        assert!(ledger.read_all().expect("readable").is_empty());
    }

    #[test]
    fn malformed_ledger_is_reported_as_corruption() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not a ledger").expect("write");

        let ledger = HistoryLedger::new(&path);
        assert!(matches!(
            ledger.read_all(),
            Err(EngineError::LedgerCorruption { .. })
        ));
        assert!(matches!(
            ledger.append(rating_entry(3)),
            Err(EngineError::LedgerCorruption { .. })
        ));
        assert_eq!(fs::read_to_string(&path).expect("read"), "{ not a ledger");
    }

    #[test]
    fn duplicate_timestamps_are_kept() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ledger = HistoryLedger::new(dir.path().join("history.json"));
        let mut a = rating_entry(2);
        let mut b = rating_entry(3);
        a.timestamp = "2025-03-01 09:00:00".to_string();
        b.timestamp = a.timestamp.clone();
        ledger.append(a).expect("append");
        ledger.append(b).expect("append");
        assert_eq!(ledger.read_all().expect("readable").len(), 2);
    }

    #[test]
    fn summary_counts_actions_and_averages_ratings() {
        let entries = vec![
            semester_entry("X", 1, 8.0, 20),
            rating_entry(5),
            rating_entry(2),
            semester_entry("X", 2, 7.0, 20),
            semester_entry("X", 3, 9.0, 20),
        ];
        let summary = summarize(&entries);
        assert_eq!(summary.entry_count, 5);
        assert_eq!(summary.rating_count, 2);
        assert_eq!(summary.average_rating, Some(3.5));
        assert_eq!(summary.by_action[0].kind, "semester-computation");
        assert_eq!(summary.by_action[0].count, 3);
        assert_eq!(summary.by_action[1].kind, "app-rating");

        assert_eq!(average_rating(&entries[..1]), None);
    }

    #[test]
    fn semester_credits_keep_latest_entry_per_semester() {
        let entries = vec![
            semester_entry("A1", 1, 6.5, 20),
            semester_entry("B2", 1, 9.9, 20),
            semester_entry("A1", 2, 7.0, 22),
            semester_entry("A1", 1, 8.0, 21),
        ];
        let pairs = semester_credits_for(&entries, "A1");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].semester, Some(1));
        assert_eq!(pairs[0].sgpa, 8.0);
        assert_eq!(pairs[0].credits, 21);
        assert_eq!(pairs[1].semester, Some(2));
    }
}
