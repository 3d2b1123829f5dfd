//! Deterministic rule-based advice
//!
//! Each bucket contributes at most one sentence, in fixed order, and the
//! closing reminder is appended last. The result keeps only the first
//! [`MAX_SENTENCES`] sentences, so the closer is cut whenever three buckets
//! already fired. Clients depend on this exact output.

use crate::models::UserProfile;

/// Sentences kept after truncation
pub const MAX_SENTENCES: usize = 3;

pub const YOUNG_ADULT: &str =
    "As a younger adult, you may benefit from high-deductible plans with lower premiums.";
pub const COMPREHENSIVE_PLAN: &str =
    "Consider comprehensive plans that cover preventive care and chronic conditions.";
pub const HIGH_BMI: &str =
    "Maintaining a healthy weight can significantly reduce your insurance costs over time.";
pub const HEALTHY_BMI: &str =
    "Your healthy BMI puts you in a lower risk category for many insurers.";
pub const SMOKER: &str =
    "Quitting smoking could reduce your premiums by up to 50% after a few years.";
pub const NON_SMOKER: &str = "As a non-smoker, you're already in a lower premium bracket.";
pub const FAMILY_PLAN: &str =
    "Families with multiple children should look for family plans with good pediatric coverage.";
pub const ABOVE_AVERAGE_COST: &str =
    "Your predicted premium is above average. Consider shopping around for quotes from multiple insurers.";
pub const BELOW_AVERAGE_COST: &str =
    "Your predicted premium is below average - great job maintaining healthy lifestyle factors!";
pub const CLOSER: &str =
    "Remember to review your policy annually and consider your changing healthcare needs.";

/// Rule-based advice generator
#[derive(Debug, Clone, Copy, Default)]
pub struct AdviceRuleEngine;

impl AdviceRuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Every sentence the rules produce, closer included, before truncation
    pub fn sentences(&self, profile: &UserProfile, predicted_cost: f64) -> Vec<&'static str> {
        let buckets = [
            age_advice(profile.age),
            bmi_advice(profile.bmi),
            Some(smoker_advice(profile)),
            children_advice(profile.children),
            cost_advice(predicted_cost),
            Some(CLOSER),
        ];
        buckets.into_iter().flatten().collect()
    }

    pub fn advise(&self, profile: &UserProfile, predicted_cost: f64) -> String {
        let sentences = self.sentences(profile, predicted_cost);
        sentences
            .into_iter()
            .take(MAX_SENTENCES)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn age_advice(age: u32) -> Option<&'static str> {
    if age < 30 {
        Some(YOUNG_ADULT)
    } else if age > 50 {
        Some(COMPREHENSIVE_PLAN)
    } else {
        None
    }
}

fn bmi_advice(bmi: f64) -> Option<&'static str> {
    if bmi > 30.0 {
        Some(HIGH_BMI)
    } else if bmi < 25.0 {
        Some(HEALTHY_BMI)
    } else {
        None
    }
}

fn smoker_advice(profile: &UserProfile) -> &'static str {
    if profile.smoker.is_smoker() {
        SMOKER
    } else {
        NON_SMOKER
    }
}

fn children_advice(children: u32) -> Option<&'static str> {
    (children > 2).then_some(FAMILY_PLAN)
}

fn cost_advice(cost: f64) -> Option<&'static str> {
    if cost > 10_000.0 {
        Some(ABOVE_AVERAGE_COST)
    } else if cost < 5_000.0 {
        Some(BELOW_AVERAGE_COST)
    } else {
        None
    }
}
