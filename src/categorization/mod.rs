// 🧠 Categorization Engine
// Free-text description → one of the user's own categories
//
// Pipeline: Keyword Dictionary → Scorer → Reconciler → Alternative Selector.
// Every call is pure: the engine only reads its immutable dictionary and the
// request, so one instance can be shared across threads.

pub mod dictionary;
pub mod reconcile;
pub mod scorer;

pub use dictionary::{DictionaryError, KeywordDictionary, KeywordSet, OTHER_LABEL};
pub use scorer::{ScoredCategory, ScoringConfig};

use crate::entities::{TransactionKind, UserCategory};
use serde::{Deserialize, Serialize};

// ============================================================================
// REQUEST / RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationRequest {
    pub description: String,
    pub kind: TransactionKind,
    /// The caller's categories of `kind`, in the caller's order
    pub candidates: Vec<UserCategory>,
}

impl CategorizationRequest {
    pub fn new(description: impl Into<String>, kind: TransactionKind, candidates: Vec<UserCategory>) -> Self {
        CategorizationRequest {
            description: description.into(),
            kind,
            candidates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationResult {
    /// One of the candidate names ("Other" only when the user owns it)
    pub category: String,

    /// 0.3 on fallback, otherwise in [0.3, 0.95]
    pub confidence: f64,

    /// Up to three other candidate names, never `category`
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategorizationError {
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("at least one category is required")]
    NoCandidates,
    #[error("category '{category}' is not an {expected} category")]
    KindMismatch {
        category: String,
        expected: TransactionKind,
    },
}

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CategorizationEngine {
    dictionary: KeywordDictionary,
    config: ScoringConfig,
}

impl CategorizationEngine {
    pub fn new(dictionary: KeywordDictionary, config: ScoringConfig) -> Self {
        CategorizationEngine { dictionary, config }
    }

    /// Engine over the built-in dictionary and default weights
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn dictionary(&self) -> &KeywordDictionary {
        &self.dictionary
    }

    pub fn categorize(&self, request: &CategorizationRequest) -> Result<CategorizationResult, CategorizationError> {
        validate(request)?;

        let scored = scorer::score_all(
            &request.description,
            self.dictionary.lookup(request.kind),
            &self.config,
        );
        let ranked = scorer::rank(scored);

        let (category, confidence) = reconcile::reconcile(&ranked, &request.candidates);
        let alternatives =
            reconcile::alternatives(&request.candidates, &category, self.config.max_alternatives);

        tracing::debug!(
            kind = %request.kind,
            matched = ranked.len(),
            category = %category,
            confidence,
            "categorized description"
        );

        Ok(CategorizationResult {
            category,
            confidence,
            alternatives,
        })
    }

    /// Ranked dictionary labels for a description, before reconciling
    pub fn score(&self, description: &str, kind: TransactionKind) -> Vec<ScoredCategory> {
        scorer::rank(scorer::score_all(
            description,
            self.dictionary.lookup(kind),
            &self.config,
        ))
    }
}

fn validate(request: &CategorizationRequest) -> Result<(), CategorizationError> {
    if request.description.trim().is_empty() {
        return Err(CategorizationError::EmptyDescription);
    }
    if request.candidates.is_empty() {
        return Err(CategorizationError::NoCandidates);
    }
    if let Some(wrong) = request.candidates.iter().find(|c| c.kind != request.kind) {
        return Err(CategorizationError::KindMismatch {
            category: wrong.name.clone(),
            expected: request.kind,
        });
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(names: &[&str]) -> Vec<UserCategory> {
        UserCategory::from_names(names.iter().copied(), TransactionKind::Expense)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_starbucks_coffee_run() {
        let engine = CategorizationEngine::builtin();
        let request = CategorizationRequest::new(
            "Starbucks coffee run",
            TransactionKind::Expense,
            expense(&["Food & Dining", "Transportation"]),
        );

        let result = engine.categorize(&request).unwrap();

        assert_eq!(result.category, "Food & Dining");
        assert!(result.confidence >= 0.6 - 1e-9);
        assert_eq!(result.alternatives, vec!["Transportation"]);
    }

    #[test]
    fn test_no_match_falls_back_to_first_candidate() {
        let engine = CategorizationEngine::builtin();
        let request = CategorizationRequest::new(
            "xyz123",
            TransactionKind::Expense,
            expense(&["Shopping", "Bills"]),
        );

        let result = engine.categorize(&request).unwrap();

        assert_eq!(result.category, "Shopping");
        assert!(approx(result.confidence, 0.3));
        assert_eq!(result.alternatives, vec!["Bills"]);
    }

    #[test]
    fn test_empty_description_is_rejected() {
        let engine = CategorizationEngine::builtin();

        for description in ["", "   "] {
            let request = CategorizationRequest::new(description, TransactionKind::Expense, expense(&["Shopping"]));
            assert_eq!(engine.categorize(&request), Err(CategorizationError::EmptyDescription));
        }
    }

    #[test]
    fn test_empty_candidates_are_rejected() {
        let engine = CategorizationEngine::builtin();
        let request = CategorizationRequest::new("coffee", TransactionKind::Expense, vec![]);

        assert_eq!(engine.categorize(&request), Err(CategorizationError::NoCandidates));
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let engine = CategorizationEngine::builtin();
        let mut candidates = expense(&["Shopping"]);
        candidates.push(UserCategory::new("x", "Salary", TransactionKind::Income));

        let request = CategorizationRequest::new("coffee", TransactionKind::Expense, candidates);

        assert_eq!(
            engine.categorize(&request),
            Err(CategorizationError::KindMismatch {
                category: "Salary".to_string(),
                expected: TransactionKind::Expense,
            })
        );
    }

    #[test]
    fn test_single_label_confidence_matches_formula() {
        let engine = CategorizationEngine::builtin();
        let candidates = expense(&["Shopping", "Healthcare", "Bills"]);

        // "doctor" + "appointment" + "clinic" → 3 Healthcare hits, nothing else
        let request = CategorizationRequest::new(
            "Doctor appointment at the clinic",
            TransactionKind::Expense,
            candidates,
        );
        let result = engine.categorize(&request).unwrap();

        assert_eq!(result.category, "Healthcare");
        assert!(approx(result.confidence, 0.75));
        assert_eq!(result.alternatives, vec!["Shopping", "Bills"]);
    }

    #[test]
    fn test_income_uses_income_dictionary() {
        let engine = CategorizationEngine::builtin();
        let candidates = UserCategory::from_names(["Freelance", "Salary"], TransactionKind::Income);

        let request = CategorizationRequest::new("Monthly salary paycheck", TransactionKind::Income, candidates);
        let result = engine.categorize(&request).unwrap();

        assert_eq!(result.category, "Salary");
        assert!(approx(result.confidence, 0.6));
    }

    #[test]
    fn test_tie_prefers_dictionary_order() {
        let engine = CategorizationEngine::builtin();
        // "gas" is both a Transportation and a Bills keyword
        let request = CategorizationRequest::new(
            "gas",
            TransactionKind::Expense,
            expense(&["Bills", "Transportation"]),
        );

        let result = engine.categorize(&request).unwrap();
        assert_eq!(result.category, "Transportation");
    }

    #[test]
    fn test_result_invariants_hold() {
        let engine = CategorizationEngine::builtin();
        let candidates = expense(&["Shopping", "Bills", "Food & Dining", "Entertainment", "Travel"]);
        let descriptions = [
            "Netflix subscription",
            "Amazon prime video",
            "Hotel booking for vacation",
            "random text",
            "Uber to the airport, then lunch",
        ];

        for description in descriptions {
            let request = CategorizationRequest::new(description, TransactionKind::Expense, candidates.clone());
            let result = engine.categorize(&request).unwrap();

            assert!(candidates.iter().any(|c| c.name == result.category));
            assert!(result.alternatives.len() <= 3);
            assert!(!result.alternatives.contains(&result.category));
            assert!(result.confidence >= 0.3 - 1e-9 && result.confidence <= 0.95 + 1e-9);

            // pure: same input, same output
            assert_eq!(engine.categorize(&request).unwrap(), result);
        }
    }

    #[test]
    fn test_custom_config_changes_weights() {
        let config = ScoringConfig {
            base_confidence: 0.5,
            per_match: 0.25,
            max_confidence: 0.9,
            max_alternatives: 1,
        };
        let engine = CategorizationEngine::new(KeywordDictionary::builtin(), config);
        let request = CategorizationRequest::new(
            "starbucks coffee",
            TransactionKind::Expense,
            expense(&["Food & Dining", "Shopping", "Bills"]),
        );

        let result = engine.categorize(&request).unwrap();

        assert!(approx(result.confidence, 0.9));
        assert_eq!(result.alternatives, vec!["Shopping"]);
    }

    #[test]
    fn test_home_and_education_keywords() {
        let engine = CategorizationEngine::builtin();

        let repair = CategorizationRequest::new("Car REPAIR", TransactionKind::Expense, expense(&["Home & Garden"]));
        let result = engine.categorize(&repair).unwrap();
        assert_eq!(result.category, "Home & Garden");
        assert!(approx(result.confidence, 0.45));

        let books = CategorizationRequest::new("textbook book", TransactionKind::Expense, expense(&["Education"]));
        let result = engine.categorize(&books).unwrap();
        assert_eq!(result.category, "Education");
        assert!(approx(result.confidence, 0.6));
    }

    #[test]
    fn test_fallback_confidence_ignores_custom_base() {
        let config = ScoringConfig {
            base_confidence: 0.5,
            ..ScoringConfig::default()
        };
        let engine = CategorizationEngine::new(KeywordDictionary::builtin(), config);

        let unmatched = CategorizationRequest::new("xyz123", TransactionKind::Expense, expense(&["Shopping", "Bills"]));
        let result = engine.categorize(&unmatched).unwrap();
        assert_eq!(result.category, "Shopping");
        assert_eq!(result.confidence, 0.3);

        let unowned = CategorizationRequest::new("starbucks", TransactionKind::Expense, expense(&["Rent"]));
        let result = engine.categorize(&unowned).unwrap();
        assert_eq!(result.category, "Rent");
        assert_eq!(result.confidence, 0.3);
    }

    #[test]
    fn test_score_exposes_ranking() {
        let engine = CategorizationEngine::builtin();
        let ranked = engine.score("water and gas bill", TransactionKind::Expense);

        assert_eq!(ranked[0].label, "Bills");
        assert!(ranked.iter().any(|s| s.label == "Transportation"));
    }
}
