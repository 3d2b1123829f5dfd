//! Prompt construction for the text-generation service

use crate::models::AdviceRequest;

/// Render the advice prompt with human-readable (not encoded) values
pub fn build_prompt(request: &AdviceRequest) -> String {
    let profile = &request.profile;
    format!(
        "Predicted Insurance Cost: ${:.2}.\n\
         User Details:\n\
         - Age: {}\n\
         - Sex: {}\n\
         - BMI: {}\n\
         - Children: {}\n\
         - Smoker: {}\n\
         - Region: {}\n\
         \n\
         Generate a concise advice or explanation for this user.\n",
        request.prediction.cost,
        profile.age,
        profile.sex.label(),
        profile.bmi,
        profile.children,
        profile.smoker.label(),
        profile.region,
    )
}
