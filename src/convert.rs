use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};
use crate::models::{Country, CountryPayload};
use crate::sgpa::round_to;

pub type CountryConversion = BTreeMap<Country, CountryPayload>;

/// Approximate equivalents of a 10-point CGPA for every supported country.
///
/// These are rough heuristics, not official equivalences.
pub fn convert(cgpa: f64) -> EngineResult<CountryConversion> {
    if !cgpa.is_finite() || !(0.0..=10.0).contains(&cgpa) {
        return Err(EngineError::InvalidInput(format!(
            "CGPA {cgpa} is outside 0..=10"
        )));
    }

    Ok(Country::ALL
        .into_iter()
        .map(|country| (country, convert_for(country, cgpa)))
        .collect())
}

/// Conversion for a single country. `cgpa` must already be validated.
fn convert_for(country: Country, cgpa: f64) -> CountryPayload {
    let percent = cgpa * 10.0;
    match country {
        Country::UnitedStates | Country::Singapore => CountryPayload::LinearScale {
            scale: "4.0".to_string(),
            value: round_to(cgpa / 10.0 * 4.0, 2),
        },
        Country::Canada => CountryPayload::SteppedScale {
            scale: "4.0".to_string(),
            value: canada_step(percent),
        },
        Country::UnitedKingdom => CountryPayload::Classification {
            label: uk_classification(percent).to_string(),
        },
        Country::Germany => CountryPayload::LinearScale {
            scale: "1.0-4.0 (lower is better)".to_string(),
            value: round_to(1.0 + 3.0 * (100.0 - percent) / 100.0, 2),
        },
        Country::Australia | Country::NewZealand => CountryPayload::SteppedScale {
            scale: "7".to_string(),
            value: seven_point_step(percent),
        },
        Country::Netherlands => CountryPayload::LinearScale {
            scale: "10".to_string(),
            value: round_to(percent / 10.0, 2),
        },
        Country::Sweden => CountryPayload::SteppedScale {
            scale: "5".to_string(),
            value: sweden_step(percent),
        },
        Country::France => CountryPayload::RawPercent { value: percent },
    }
}

fn canada_step(percent: f64) -> f64 {
    match percent {
        p if p >= 90.0 => 4.0,
        p if p >= 85.0 => 3.7,
        p if p >= 80.0 => 3.3,
        p if p >= 75.0 => 3.0,
        p if p >= 70.0 => 2.7,
        _ => 2.0,
    }
}

fn uk_classification(percent: f64) -> &'static str {
    match percent {
        p if p >= 70.0 => "First",
        p if p >= 60.0 => "2:1",
        p if p >= 50.0 => "2:2",
        p if p >= 40.0 => "Third",
        _ => "Fail",
    }
}

fn seven_point_step(percent: f64) -> f64 {
    match percent {
        p if p >= 85.0 => 7.0,
        p if p >= 75.0 => 6.0,
        p if p >= 65.0 => 5.0,
        p if p >= 50.0 => 4.0,
        _ => 2.0,
    }
}

fn sweden_step(percent: f64) -> f64 {
    match percent {
        p if p >= 90.0 => 5.0,
        p if p >= 75.0 => 4.0,
        p if p >= 60.0 => 3.0,
        p if p >= 50.0 => 2.0,
        _ => 1.0,
    }
}

/// Admission outlook for a converted US GPA.
pub fn us_guidance(gpa: f64) -> &'static str {
    if gpa >= 3.5 {
        "Excellent: competitive for many US master's programs."
    } else if gpa >= 3.0 {
        "Good: many programs accept this range with a strong statement of purpose."
    } else {
        "Consider improving CGPA or highlighting projects and research."
    }
}
