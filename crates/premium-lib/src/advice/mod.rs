//! Advice generation: rule engine, generative advisor, Gemini client

mod gemini;
mod generative;
mod prompt;
mod rules;

pub use gemini::{GeminiClient, GeminiConfig, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
pub use generative::{
    Advice, AttemptState, CancelHandle, CancelSignal, GenerativeAdvisor, RetryPolicy,
    TextGenerator, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS,
    UNAVAILABLE_NOTICE,
};
pub use prompt::build_prompt;
pub use rules::{
    AdviceRuleEngine, ABOVE_AVERAGE_COST, BELOW_AVERAGE_COST, CLOSER, FAMILY_PLAN, MAX_SENTENCES,
    NON_SMOKER,
};
