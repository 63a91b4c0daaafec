// Finance Tracker - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod categorization;
pub mod config;
pub mod db;
pub mod entities;
pub mod feedback;
#[cfg(feature = "server")]
pub mod server;

use std::sync::Once;

// Re-export commonly used types
pub use categorization::{
    CategorizationEngine, CategorizationError, CategorizationRequest, CategorizationResult,
    DictionaryError, KeywordDictionary, KeywordSet, ScoredCategory, ScoringConfig, OTHER_LABEL,
};
pub use config::AppConfig;
pub use db::{
    delete_category, get_candidate_categories, get_categories, get_category, get_feedback_stats,
    get_recent_feedback, insert_category, insert_feedback, open_database, setup_database,
};
pub use entities::{Category, TransactionKind, UserCategory};
pub use feedback::{FeedbackRecord, FeedbackStats, NewFeedback, SuggestionCount};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static INIT_TRACING: Once = Once::new();

/// Install the global tracing subscriber once.
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_tracing(default_filter: &str) {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        // A subscriber may already be installed by an embedding application
        let _ = fmt().with_env_filter(filter).try_init();
        tracing::debug!(version = VERSION, "tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_does_not_panic_twice() {
        super::init_tracing("finance_tracker=debug");
        super::init_tracing("finance_tracker=debug");
    }
}
