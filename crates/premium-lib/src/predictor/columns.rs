//! Column alignment between feature records and model schemas
//!
//! Models may be trained on a superset of the six canonical features. Any
//! column the model expects but the record lacks is filled with
//! [`MISSING_FEATURE_DEFAULT`] before inference, which treats missing signal
//! as zero and can bias the estimate. The policy is kept as-is so existing
//! model artifacts keep producing the numbers they were validated with.

use crate::error::ModelError;
use crate::models::FeatureRecord;

/// Value injected for expected columns missing from the record
pub const MISSING_FEATURE_DEFAULT: f32 = 0.0;

/// Insert the default for every expected column the record lacks.
///
/// Returns the names that were filled.
pub fn fill_missing_columns(record: &mut FeatureRecord, expected: &[String]) -> Vec<String> {
    let mut filled = Vec::new();
    for name in expected {
        if !record.contains(name) {
            record.insert(name.clone(), MISSING_FEATURE_DEFAULT);
            filled.push(name.clone());
        }
    }
    filled
}

/// Pick record values in exactly the expected order, dropping extras
pub fn select_columns(record: &FeatureRecord, expected: &[String]) -> Result<Vec<f32>, ModelError> {
    expected
        .iter()
        .map(|name| {
            record
                .get(name)
                .ok_or_else(|| ModelError::prediction(format!("feature '{}' could not be resolved", name)))
        })
        .collect()
}

/// Fill then select; the full alignment step run before inference
pub fn align_columns(
    mut record: FeatureRecord,
    expected: &[String],
) -> Result<(Vec<f32>, Vec<String>), ModelError> {
    let filled = fill_missing_columns(&mut record, expected);
    let values = select_columns(&record, expected)?;
    Ok((values, filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Region, Sex, Smoker, UserProfile};

    fn record() -> FeatureRecord {
        FeatureRecord::from_profile(&UserProfile {
            age: 30,
            sex: Sex::Female,
            bmi: 24.0,
            children: 1,
            smoker: Smoker::Yes,
            region: Region::SouthEast,
        })
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_column_filled_with_zero() {
        let expected = names(&["age", "sex", "bmi", "children", "smoker", "region", "extra_feature"]);
        let (values, filled) = align_columns(record(), &expected).unwrap();
        assert_eq!(filled, vec!["extra_feature".to_string()]);
        assert_eq!(values, vec![30.0, 0.0, 24.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_columns_reordered_to_model_schema() {
        let expected = names(&["region", "smoker", "age"]);
        let (values, filled) = align_columns(record(), &expected).unwrap();
        assert!(filled.is_empty());
        assert_eq!(values, vec![1.0, 1.0, 30.0]);
    }

    #[test]
    fn test_select_without_fill_reports_missing_feature() {
        let err = select_columns(&record(), &names(&["age", "income"])).unwrap_err();
        assert!(matches!(err, ModelError::Prediction { .. }));
        assert!(err.to_string().contains("income"));
    }
}
