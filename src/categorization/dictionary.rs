// 📖 Keyword Dictionary - Rules as Data
// Canonical category labels and the substrings that trigger them

use crate::entities::TransactionKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Label returned when nothing in the dictionary matches
pub const OTHER_LABEL: &str = "Other";

// ============================================================================
// KEYWORD SET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    /// Canonical label (e.g., "Food & Dining"), not necessarily a user category name
    pub label: String,

    /// Lowercase trigger substrings, in declaration order
    pub keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        KeywordSet {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("failed to read keyword file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse keyword JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no keyword sets defined for {0}")]
    EmptyKind(TransactionKind),
    #[error("invalid keyword set '{label}': {reason}")]
    InvalidSet { label: String, reason: String },
}

// ============================================================================
// DICTIONARY
// ============================================================================

/// Immutable label → keywords table, one ordered list per transaction kind.
///
/// Iteration order is significant: it breaks confidence ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordDictionary {
    expense: Vec<KeywordSet>,
    income: Vec<KeywordSet>,
}

impl KeywordDictionary {
    /// Build from explicit tables, validating every entry
    pub fn new(expense: Vec<KeywordSet>, income: Vec<KeywordSet>) -> Result<Self, DictionaryError> {
        let dictionary = KeywordDictionary {
            expense: normalize(expense),
            income: normalize(income),
        };
        dictionary.validate()?;
        Ok(dictionary)
    }

    /// Load a dictionary from a JSON file:
    /// `{ "expense": [{ "label": .., "keywords": [..] }], "income": [..] }`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, DictionaryError> {
        let raw: KeywordDictionary = serde_json::from_str(content)?;
        Self::new(raw.expense, raw.income)
    }

    /// Built-in tables
    ///
    /// Expense: the server-side labels first, then the extra client-side
    /// labels (Travel, Education, Home & Garden, Personal Care).
    /// Income: the client-side income labels.
    pub fn builtin() -> Self {
        let expense = vec![
            KeywordSet::new(
                "Food & Dining",
                &[
                    "food", "lunch", "dinner", "breakfast", "coffee", "restaurant", "cafe",
                    "pizza", "burger", "meal", "snack", "drink", "beverage", "starbucks",
                    "mcdonalds", "kfc", "subway", "dominos", "chipotle", "taco", "sushi",
                ],
            ),
            KeywordSet::new(
                "Transportation",
                &[
                    "uber", "lyft", "taxi", "gas", "fuel", "parking", "toll", "bus", "train",
                    "subway", "metro", "car", "vehicle", "maintenance", "repair",
                ],
            ),
            KeywordSet::new(
                "Shopping",
                &[
                    "amazon", "walmart", "target", "mall", "store", "clothes", "shoes",
                    "electronics", "books", "gifts", "purchase", "buy",
                ],
            ),
            KeywordSet::new(
                "Bills",
                &[
                    "electricity", "water", "gas", "internet", "phone", "cable", "rent",
                    "mortgage", "insurance", "utility", "bill", "payment",
                ],
            ),
            KeywordSet::new(
                "Entertainment",
                &[
                    "movie", "theater", "concert", "show", "game", "netflix", "spotify", "hulu",
                    "disney", "amazon prime", "subscription",
                ],
            ),
            KeywordSet::new(
                "Healthcare",
                &[
                    "doctor", "hospital", "pharmacy", "medicine", "dental", "vision", "medical",
                    "health", "clinic", "appointment",
                ],
            ),
            KeywordSet::new(
                "Travel",
                &[
                    "hotel", "flight", "airline", "vacation", "trip", "travel", "booking",
                    "resort", "airbnb",
                ],
            ),
            KeywordSet::new(
                "Education",
                &[
                    "school", "university", "college", "course", "book", "textbook", "tuition",
                    "education", "learning",
                ],
            ),
            KeywordSet::new(
                "Home & Garden",
                &[
                    "home", "garden", "furniture", "decor", "repair", "maintenance", "tools",
                    "hardware",
                ],
            ),
            KeywordSet::new(
                "Personal Care",
                &["haircut", "salon", "spa", "beauty", "cosmetic", "gym", "fitness", "wellness"],
            ),
        ];

        let income = vec![
            KeywordSet::new("Salary", &["salary", "paycheck", "wage", "job", "work"]),
            KeywordSet::new("Freelance", &["freelance", "contract", "project", "consulting"]),
            KeywordSet::new(
                "Investment",
                &["investment", "dividend", "stock", "bond", "interest"],
            ),
            KeywordSet::new("Business", &["business", "company", "startup", "entrepreneur"]),
            KeywordSet::new("Gift", &["gift", "present", "donation", "charity"]),
            KeywordSet::new("Refund", &["refund", "return", "cashback", "rebate"]),
        ];

        KeywordDictionary { expense, income }
    }

    /// Keyword sets for a kind, in dictionary order. Never empty.
    pub fn lookup(&self, kind: TransactionKind) -> &[KeywordSet] {
        match kind {
            TransactionKind::Expense => &self.expense,
            TransactionKind::Income => &self.income,
        }
    }

    pub fn labels(&self, kind: TransactionKind) -> Vec<&str> {
        self.lookup(kind).iter().map(|set| set.label.as_str()).collect()
    }

    /// Labels followed by the "Other" sentinel, for callers with no
    /// categories of their own
    pub fn default_categories(&self, kind: TransactionKind) -> Vec<String> {
        let mut categories: Vec<String> = self
            .labels(kind)
            .into_iter()
            .filter(|label| *label != OTHER_LABEL)
            .map(str::to_string)
            .collect();
        categories.push(OTHER_LABEL.to_string());
        categories
    }

    fn validate(&self) -> Result<(), DictionaryError> {
        for kind in TransactionKind::all() {
            let sets = self.lookup(kind);
            if sets.is_empty() {
                return Err(DictionaryError::EmptyKind(kind));
            }

            for set in sets {
                if set.label.trim().is_empty() {
                    return Err(DictionaryError::InvalidSet {
                        label: set.label.clone(),
                        reason: "label is blank".to_string(),
                    });
                }
                if set.keywords.is_empty() {
                    return Err(DictionaryError::InvalidSet {
                        label: set.label.clone(),
                        reason: "no keywords".to_string(),
                    });
                }
                if set.keywords.iter().any(|k| k.is_empty()) {
                    return Err(DictionaryError::InvalidSet {
                        label: set.label.clone(),
                        reason: "empty keyword".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Default for KeywordDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Matching runs against a lowercased description, so keywords must be lowercase too
fn normalize(sets: Vec<KeywordSet>) -> Vec<KeywordSet> {
    sets.into_iter()
        .map(|set| KeywordSet {
            label: set.label,
            keywords: set.keywords.iter().map(|k| k.trim().to_lowercase()).collect(),
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
