//! Feature construction from raw form input
//!
//! Numeric fields fail fast with a field-identifying error. Categorical
//! fields never fail: unrecognized values resolve through the named default
//! policies below, so a typo in `region` quietly becomes `SouthWest`.

use crate::error::ValidationError;
use crate::models::{FeatureRecord, RawSubmission, Region, Sex, Smoker, UserProfile};
use tracing::debug;

/// Builds validated profiles and feature records from raw submissions
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Validate a raw submission into a profile
    pub fn build_profile(&self, raw: &RawSubmission) -> Result<UserProfile, ValidationError> {
        let age = parse_count("age", raw.age.as_deref())?;
        let bmi = parse_bmi(raw.bmi.as_deref())?;
        let children = parse_count("children", raw.children.as_deref())?;

        Ok(UserProfile {
            age,
            sex: sex_or_default(raw.sex.as_deref()),
            bmi,
            children,
            smoker: smoker_or_default(raw.smoker.as_deref()),
            region: region_or_default(raw.region.as_deref()),
        })
    }

    /// Validate and encode a raw submission
    pub fn build(&self, raw: &RawSubmission) -> Result<FeatureRecord, ValidationError> {
        let profile = self.build_profile(raw)?;
        Ok(FeatureRecord::from_profile(&profile))
    }
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::new(field, "a value is required")),
    }
}

fn parse_count(field: &'static str, value: Option<&str>) -> Result<u32, ValidationError> {
    let text = required(field, value)?;
    let parsed: i64 = text
        .parse()
        .map_err(|_| ValidationError::new(field, format!("'{}' is not a whole number", text)))?;
    if parsed < 0 {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    u32::try_from(parsed).map_err(|_| ValidationError::new(field, "value is too large"))
}

fn parse_bmi(value: Option<&str>) -> Result<f64, ValidationError> {
    let text = required("bmi", value)?;
    let parsed: f64 = text
        .parse()
        .map_err(|_| ValidationError::new("bmi", format!("'{}' is not a number", text)))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(ValidationError::new("bmi", "must be a positive number"));
    }
    Ok(parsed)
}

/// Only the exact value `female` encodes as female; anything else is male.
pub fn sex_or_default(value: Option<&str>) -> Sex {
    match value {
        Some("female") => Sex::Female,
        Some("male") => Sex::Male,
        other => {
            debug!(field = "sex", value = ?other, "Unrecognized sex, defaulting to male");
            Sex::Male
        }
    }
}

/// Only the exact value `no` encodes as a non-smoker; anything else is a smoker.
pub fn smoker_or_default(value: Option<&str>) -> Smoker {
    match value {
        Some("no") => Smoker::No,
        Some("yes") => Smoker::Yes,
        other => {
            debug!(field = "smoker", value = ?other, "Unrecognized smoker status, defaulting to yes");
            Smoker::Yes
        }
    }
}

/// Unknown or missing regions resolve to SouthWest (code 0).
///
/// This masks user error, but models were validated against it so it stays.
pub fn region_or_default(value: Option<&str>) -> Region {
    match value.and_then(Region::from_name) {
        Some(region) => region,
        None => {
            debug!(field = "region", value = ?value, "Unrecognized region, defaulting to SouthWest");
            Region::SouthWest
        }
    }
}
