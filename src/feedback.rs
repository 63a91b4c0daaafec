// 📝 Categorization Feedback
// Records whether a suggestion was accepted or overridden, and summarizes accuracy
//
// The engine never writes feedback. The caller builds a `FeedbackRecord` after
// the user accepts or overrides a suggestion and hands it to the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_CATEGORY_LEN: usize = 100;

/// How many wrong suggestions the stats endpoint reports
pub const TOP_INCORRECT_LIMIT: usize = 5;

/// How many records the "recent" listing returns
pub const RECENT_LIMIT: usize = 20;

// ============================================================================
// FEEDBACK RECORD
// ============================================================================

/// Feedback as submitted by the user, before it gets an identity
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub original_description: String,
    pub suggested_category: String,
    pub user_selected_category: String,
    pub is_correct: bool,
}

impl NewFeedback {
    /// Trim text fields and check their lengths. Returns every problem found.
    pub fn validated(self) -> Result<NewFeedback, Vec<String>> {
        let feedback = NewFeedback {
            original_description: self.original_description.trim().to_string(),
            suggested_category: self.suggested_category.trim().to_string(),
            user_selected_category: self.user_selected_category.trim().to_string(),
            is_correct: self.is_correct,
        };

        let mut errors = Vec::new();
        check_len(&mut errors, "originalDescription", &feedback.original_description, MAX_DESCRIPTION_LEN);
        check_len(&mut errors, "suggestedCategory", &feedback.suggested_category, MAX_CATEGORY_LEN);
        check_len(&mut errors, "userSelectedCategory", &feedback.user_selected_category, MAX_CATEGORY_LEN);

        if errors.is_empty() {
            Ok(feedback)
        } else {
            Err(errors)
        }
    }
}

/// Push a message when `value` is empty or longer than `max` characters
pub(crate) fn check_len(errors: &mut Vec<String>, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len == 0 || len > max {
        errors.push(format!("{} must be between 1 and {} characters", field, max));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: String,
    pub user_id: String,
    pub original_description: String,
    pub suggested_category: String,
    pub user_selected_category: String,
    pub is_correct: bool,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(user_id: &str, feedback: NewFeedback) -> Self {
        FeedbackRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            original_description: feedback.original_description,
            suggested_category: feedback.suggested_category,
            user_selected_category: feedback.user_selected_category,
            is_correct: feedback.is_correct,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub total_feedback: i64,
    pub correct_predictions: i64,
    pub incorrect_predictions: i64,
    /// Percent of correct predictions, two decimal places
    pub accuracy: f64,
    pub top_incorrect_suggestions: Vec<SuggestionCount>,
}

impl FeedbackStats {
    pub fn new(
        total_feedback: i64,
        correct_predictions: i64,
        incorrect_predictions: i64,
        top_incorrect_suggestions: Vec<SuggestionCount>,
    ) -> Self {
        FeedbackStats {
            total_feedback,
            correct_predictions,
            incorrect_predictions,
            accuracy: accuracy_percent(correct_predictions, total_feedback),
            top_incorrect_suggestions,
        }
    }
}

/// `correct / total * 100`, rounded to two decimals; 0 with no feedback
pub fn accuracy_percent(correct: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let percent = correct as f64 / total as f64 * 100.0;
    (percent * 100.0).round() / 100.0
}

// ============================================================================
// TESTS
// ============================================================================
