use crate::error::{EngineError, EngineResult};
use crate::models::{Grade, GradeBand};

/// Ordered from the highest band down. Each band is `[min, max)` except the
/// top band, which also includes 100.
pub const BANDS: [GradeBand; 8] = [
    GradeBand { min_percent: 90.0, max_percent: 100.0, label: "O", points: 10.0 },
    GradeBand { min_percent: 80.0, max_percent: 90.0, label: "A+", points: 9.0 },
    GradeBand { min_percent: 70.0, max_percent: 80.0, label: "A", points: 8.0 },
    GradeBand { min_percent: 60.0, max_percent: 70.0, label: "B+", points: 7.0 },
    GradeBand { min_percent: 50.0, max_percent: 60.0, label: "B", points: 6.0 },
    GradeBand { min_percent: 45.0, max_percent: 50.0, label: "C", points: 5.0 },
    GradeBand { min_percent: 40.0, max_percent: 45.0, label: "D", points: 4.0 },
    GradeBand { min_percent: 0.0, max_percent: 40.0, label: "F", points: 0.0 },
];

const POINTS_TOLERANCE: f64 = 1e-6;

impl GradeBand {
    pub fn contains(&self, percent: f64) -> bool {
        if percent < self.min_percent {
            return false;
        }
        percent < self.max_percent || (self.max_percent >= 100.0 && percent <= self.max_percent)
    }

    pub fn grade(&self) -> Grade {
        Grade {
            label: self.label,
            points: self.points,
        }
    }
}

/// Maps a percentage in `[0, 100]` to its letter grade and 10-point value.
pub fn lookup(percent: f64) -> EngineResult<Grade> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(EngineError::InvalidScore(format!(
            "{percent} is outside 0..=100"
        )));
    }

    BANDS
        .iter()
        .find(|band| band.contains(percent))
        .map(GradeBand::grade)
        .ok_or_else(|| EngineError::InvalidScore(format!("{percent} matches no grade band")))
}

/// Like [`lookup`], for a score that has not been parsed yet.
pub fn lookup_raw(raw: &str) -> EngineResult<Grade> {
    let percent: f64 = raw
        .trim()
        .parse()
        .map_err(|_| EngineError::InvalidScore(format!("'{}' is not a number", raw.trim())))?;
    lookup(percent)
}

/// The smallest percentage that earns `points`.
pub fn lower_bound_for(points: f64) -> EngineResult<f64> {
    BANDS
        .iter()
        .find(|band| (band.points - points).abs() < POINTS_TOLERANCE)
        .map(|band| band.min_percent)
        .ok_or(EngineError::UnknownGrade(points))
}
