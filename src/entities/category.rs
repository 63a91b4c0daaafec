// 🏷️ Category Entity - user-owned spending/income categories
//
// "Category name is a VALUE the user picks, Category UUID is IDENTITY"
//
// The categorization engine only ever reads the (id, name, kind) triple, see
// `UserCategory`. The stored `Category` carries the display fields the
// service exposes over HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TRANSACTION KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Money coming in
    Income,

    /// Money going out
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "INCOME",
            TransactionKind::Expense => "EXPENSE",
        }
    }

    pub fn all() -> [TransactionKind; 2] {
        [TransactionKind::Income, TransactionKind::Expense]
    }

    /// Exact wire form only: "INCOME" or "EXPENSE"
    pub fn from_wire(s: &str) -> Result<Self, ParseKindError> {
        match s {
            "INCOME" => Ok(TransactionKind::Income),
            "EXPENSE" => Ok(TransactionKind::Expense),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names neither kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction type '{0}' (expected INCOME or EXPENSE)")]
pub struct ParseKindError(pub String);

impl FromStr for TransactionKind {
    type Err = ParseKindError;

    /// Case-insensitive: "INCOME", "income" and "Income" all parse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(TransactionKind::Income),
            "EXPENSE" => Ok(TransactionKind::Expense),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

// ============================================================================
// USER CATEGORY (engine view)
// ============================================================================

/// The part of a category the categorization engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCategory {
    pub id: String,
    pub name: String,
    pub kind: TransactionKind,
}

impl UserCategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: TransactionKind) -> Self {
        UserCategory {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    /// Candidate list built from bare names, ids are generated.
    /// Used by the CLI where categories do not come from the store.
    pub fn from_names<I, S>(names: I, kind: TransactionKind) -> Vec<UserCategory>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(|name| UserCategory::new(uuid::Uuid::new_v4().to_string(), name, kind))
            .collect()
    }
}

// ============================================================================
// CATEGORY ENTITY (stored)
// ============================================================================

/// Category as persisted for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Stable identity (UUID) - NEVER changes
    pub id: String,

    /// Owner of the category
    pub user_id: String,

    /// Category name (e.g., "Food & Dining"), unique per user
    pub name: String,

    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Hex color for UI (e.g., "#FF5733")
    pub color: String,

    /// Short icon for UI (e.g., "🍽️")
    pub icon: String,

    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create new category entity with UUID and neutral display fields
    pub fn new(user_id: &str, name: &str, kind: TransactionKind) -> Self {
        Self::with_display(user_id, name, kind, "#9E9E9E", "🏷️")
    }

    /// Create category with icon and color
    pub fn with_display(
        user_id: &str,
        name: &str,
        kind: TransactionKind,
        color: &str,
        icon: &str,
    ) -> Self {
        Category {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            kind,
            color: color.to_string(),
            icon: icon.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn to_user_category(&self) -> UserCategory {
        UserCategory::new(self.id.clone(), self.name.clone(), self.kind)
    }
}

/// Check a `#RGB` / `#RRGGBB` hex color
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_case_insensitively() {
        assert_eq!("INCOME".parse::<TransactionKind>(), Ok(TransactionKind::Income));
        assert_eq!("expense".parse::<TransactionKind>(), Ok(TransactionKind::Expense));
        assert_eq!(" Expense ".parse::<TransactionKind>(), Ok(TransactionKind::Expense));
        assert!("TRANSFER".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_wire_kind_is_exact() {
        assert_eq!(TransactionKind::from_wire("INCOME"), Ok(TransactionKind::Income));
        assert_eq!(TransactionKind::from_wire("EXPENSE"), Ok(TransactionKind::Expense));
        assert!(TransactionKind::from_wire("income").is_err());
        assert!(TransactionKind::from_wire("Expense").is_err());
        assert!(TransactionKind::from_wire(" EXPENSE").is_err());
    }

    #[test]
    fn test_kind_serializes_uppercase() {
        let json = serde_json::to_string(&TransactionKind::Expense).unwrap();
        assert_eq!(json, "\"EXPENSE\"");

        let kind: TransactionKind = serde_json::from_str("\"INCOME\"").unwrap();
        assert_eq!(kind, TransactionKind::Income);
    }

    #[test]
    fn test_category_creation() {
        let category = Category::new("user-1", "Groceries", TransactionKind::Expense);

        assert!(!category.id.is_empty());
        assert_eq!(category.user_id, "user-1");
        assert_eq!(category.name, "Groceries");
        assert_eq!(category.kind, TransactionKind::Expense);

        let view = category.to_user_category();
        assert_eq!(view.id, category.id);
        assert_eq!(view.name, "Groceries");
    }

    #[test]
    fn test_category_json_uses_type_field() {
        let category = Category::with_display("u", "Salary", TransactionKind::Income, "#4CAF50", "💼");
        let value = serde_json::to_value(&category).unwrap();

        assert_eq!(value["type"], "INCOME");
        assert_eq!(value["userId"], "u");
        assert_eq!(value["color"], "#4CAF50");
    }

    #[test]
    fn test_from_names_keeps_order() {
        let candidates = UserCategory::from_names(["Shopping", "Bills"], TransactionKind::Expense);
        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, vec!["Shopping", "Bills"]);
        assert_ne!(candidates[0].id, candidates[1].id);
    }

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color("#FF5733"));
        assert!(is_hex_color("#abc"));
        assert!(!is_hex_color("FF5733"));
        assert!(!is_hex_color("#GG0000"));
        assert!(!is_hex_color("#FF57"));
    }
}
