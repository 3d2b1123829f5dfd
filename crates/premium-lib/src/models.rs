//! Core data models for the premium predictor

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical feature order consumed by the regression model
pub const FEATURE_NAMES: [&str; 6] = ["age", "sex", "bmi", "children", "smoker", "region"];

/// Raw form submission as received from the presentation layer.
///
/// Every field is kept as submitted text; numeric values sent as JSON
/// numbers are accepted too and stringified on the way in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSubmission {
    #[serde(default, deserialize_with = "string_or_number")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub bmi: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub children: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub smoker: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub region: Option<String>,
}

impl RawSubmission {
    pub fn new(
        age: impl Into<String>,
        sex: impl Into<String>,
        bmi: impl Into<String>,
        children: impl Into<String>,
        smoker: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            age: Some(age.into()),
            sex: Some(sex.into()),
            bmi: Some(bmi.into()),
            children: Some(children.into()),
            smoker: Some(smoker.into()),
            region: Some(region.into()),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn code(self) -> f32 {
        match self {
            Sex::Female => 0.0,
            Sex::Male => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoker {
    Yes,
    No,
}

impl Smoker {
    pub fn code(self) -> f32 {
        match self {
            Smoker::No => 0.0,
            Smoker::Yes => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Smoker::Yes => "Yes",
            Smoker::No => "No",
        }
    }

    pub fn is_smoker(self) -> bool {
        self == Smoker::Yes
    }
}

/// Geographic region, encoded 0..=3 in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    SouthWest,
    SouthEast,
    NorthWest,
    NorthEast,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::SouthWest,
        Region::SouthEast,
        Region::NorthWest,
        Region::NorthEast,
    ];

    pub fn code(self) -> f32 {
        match self {
            Region::SouthWest => 0.0,
            Region::SouthEast => 1.0,
            Region::NorthWest => 2.0,
            Region::NorthEast => 3.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::SouthWest => "SouthWest",
            Region::SouthEast => "SouthEast",
            Region::NorthWest => "NorthWest",
            Region::NorthEast => "NorthEast",
        }
    }

    /// Exact match on the form value (`SouthWest`, `SouthEast`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated user attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: u32,
    pub sex: Sex,
    pub bmi: f64,
    pub children: u32,
    pub smoker: Smoker,
    pub region: Region,
}

/// Ordered feature name -> value mapping fed to the regression model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    columns: Vec<(String, f32)>,
}

impl FeatureRecord {
    /// Encode a profile using the fixed category encodings
    pub fn from_profile(profile: &UserProfile) -> Self {
        let values = [
            profile.age as f32,
            profile.sex.code(),
            profile.bmi as f32,
            profile.children as f32,
            profile.smoker.code(),
            profile.region.code(),
        ];
        Self {
            columns: FEATURE_NAMES
                .iter()
                .zip(values)
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| *value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(column, _)| column == name)
    }

    /// Append a column; existing columns are never overwritten
    pub fn insert(&mut self, name: impl Into<String>, value: f32) {
        let name = name.into();
        if !self.contains(&name) {
            self.columns.push((name, value));
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Point estimate produced by the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub cost: f64,
}

/// Everything the advisors need to explain a prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdviceRequest {
    pub profile: UserProfile,
    pub prediction: PredictionResult,
}

impl AdviceRequest {
    pub fn new(profile: UserProfile, prediction: PredictionResult) -> Self {
        Self { profile, prediction }
    }
}

/// Where the advice text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceSource {
    Generated,
    Fallback,
}

impl AdviceSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AdviceSource::Generated => "generated",
            AdviceSource::Fallback => "fallback",
        }
    }
}

/// Terminal artifact handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalOutcome {
    pub predicted_cost: f64,
    pub advice_text: String,
    pub advice_source: AdviceSource,
    pub model_version: String,
}

impl FinalOutcome {
    /// Cost with two decimals, as shown to users
    pub fn formatted_cost(&self) -> String {
        format!("{:.2}", self.predicted_cost)
    }
}

/// Round a cost to cents
pub fn round_to_cents(cost: f64) -> f64 {
    (cost * 100.0).round() / 100.0
}
