//! Test fixtures and factory functions for creating test data.

use std::collections::BTreeMap;

use serde_json::json;

use quiz_backend::models::{GradingMode, QuestionId, SubmitResultRequest};

/// Result request with `total` answers of which the first `score` are marked correct.
pub fn submit_result_request(score: u32, total: u32) -> SubmitResultRequest {
    let answers: BTreeMap<QuestionId, String> = (1..=total)
        .map(|i| (QuestionId::positional(i as usize), format!("Answer {i}")))
        .collect();

    SubmitResultRequest {
        answers,
        score,
        total,
        grading: GradingMode::Batch,
    }
}

/// Create a register request JSON body.
pub fn register_request(name: Option<&str>) -> serde_json::Value {
    json!({ "name": name })
}
