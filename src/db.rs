// 🗄️ SQLite store - user categories and categorization feedback

use crate::entities::{Category, TransactionKind};
use crate::feedback::{FeedbackRecord, FeedbackStats, SuggestionCount, TOP_INCORRECT_LIMIT};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!(journal_mode = %mode, "database opened");

    // ==========================================================================
    // Categories Table (names unique per user)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('INCOME', 'EXPENSE')),
            color TEXT NOT NULL,
            icon TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (user_id, name)
        )",
        [],
    )?;

    // ==========================================================================
    // AI Feedback Table (append-only)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS ai_feedback (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            original_description TEXT NOT NULL,
            suggested_category TEXT NOT NULL,
            user_selected_category TEXT NOT NULL,
            is_correct INTEGER NOT NULL,
            timestamp TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_categories_user_kind ON categories(user_id, kind)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_feedback_user_time ON ai_feedback(user_id, timestamp)",
        [],
    )?;

    Ok(())
}

/// Fixed-width RFC 3339 so text ordering matches time ordering
fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(index: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e)))
}

// ============================================================================
// CATEGORIES
// ============================================================================

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let kind_str: String = row.get(3)?;
    let kind = kind_str.parse::<TransactionKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        kind,
        color: row.get(4)?,
        icon: row.get(5)?,
        created_at: parse_timestamp(6, row.get(6)?)?,
    })
}

const CATEGORY_COLUMNS: &str = "id, user_id, name, kind, color, icon, created_at";

/// Insert a category. Returns `false` when the user already has one with that name.
pub fn insert_category(conn: &Connection, category: &Category) -> Result<bool> {
    let result = conn.execute(
        "INSERT INTO categories (id, user_id, name, kind, color, icon, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            category.id,
            category.user_id,
            category.name,
            category.kind.as_str(),
            category.color,
            category.icon,
            format_timestamp(&category.created_at),
        ],
    );

    match result {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// All categories of a user, optionally of one kind, ordered by kind then name
pub fn get_categories(
    conn: &Connection,
    user_id: &str,
    kind: Option<TransactionKind>,
) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS}
         FROM categories
         WHERE user_id = ?1 AND (?2 IS NULL OR kind = ?2)
         ORDER BY kind ASC, name ASC"
    ))?;

    let categories = stmt
        .query_map(params![user_id, kind.map(|k| k.as_str())], category_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(categories)
}

/// Categories of one kind in creation order, as handed to the engine
pub fn get_candidate_categories(
    conn: &Connection,
    user_id: &str,
    kind: TransactionKind,
) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS}
         FROM categories
         WHERE user_id = ?1 AND kind = ?2
         ORDER BY created_at ASC, rowid ASC"
    ))?;

    let categories = stmt
        .query_map(params![user_id, kind.as_str()], category_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(categories)
}

pub fn get_category(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id],
            category_from_row,
        )
        .optional()?;

    Ok(category)
}

/// Delete a user's category. Returns `false` when nothing matched.
pub fn delete_category(conn: &Connection, user_id: &str, id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM categories WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;

    Ok(deleted > 0)
}

// ============================================================================
// FEEDBACK
// ============================================================================

pub fn insert_feedback(conn: &Connection, record: &FeedbackRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO ai_feedback (
            id, user_id, original_description, suggested_category,
            user_selected_category, is_correct, timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.user_id,
            record.original_description,
            record.suggested_category,
            record.user_selected_category,
            record.is_correct,
            format_timestamp(&record.timestamp),
        ],
    )
    .context("Failed to insert feedback")?;

    Ok(())
}

/// Newest first, at most `limit`
pub fn get_recent_feedback(conn: &Connection, user_id: &str, limit: usize) -> Result<Vec<FeedbackRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, original_description, suggested_category,
                user_selected_category, is_correct, timestamp
         FROM ai_feedback
         WHERE user_id = ?1
         ORDER BY timestamp DESC, rowid DESC
         LIMIT ?2",
    )?;

    let records = stmt
        .query_map(params![user_id, limit as i64], |row| {
            Ok(FeedbackRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                original_description: row.get(2)?,
                suggested_category: row.get(3)?,
                user_selected_category: row.get(4)?,
                is_correct: row.get(5)?,
                timestamp: parse_timestamp(6, row.get(6)?)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Accuracy summary for one user
pub fn get_feedback_stats(conn: &Connection, user_id: &str) -> Result<FeedbackStats> {
    let (total, correct): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_correct THEN 1 ELSE 0 END), 0)
         FROM ai_feedback
         WHERE user_id = ?1",
        params![user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let mut stmt = conn.prepare(
        "SELECT suggested_category, COUNT(*) as count
         FROM ai_feedback
         WHERE user_id = ?1 AND is_correct = 0
         GROUP BY suggested_category
         ORDER BY count DESC, suggested_category ASC
         LIMIT ?2",
    )?;

    let top = stmt
        .query_map(params![user_id, TOP_INCORRECT_LIMIT as i64], |row| {
            Ok(SuggestionCount {
                category: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeedbackStats::new(total, correct, total - correct, top))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::NewFeedback;
    use chrono::Duration;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn feedback(user: &str, suggested: &str, selected: &str) -> FeedbackRecord {
        FeedbackRecord::new(
            user,
            NewFeedback {
                original_description: "test".to_string(),
                suggested_category: suggested.to_string(),
                user_selected_category: selected.to_string(),
                is_correct: suggested == selected,
            },
        )
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = memory_db();
        setup_database(&conn).unwrap();
    }

    #[test]
    fn test_other_constraint_failures_are_errors() {
        let conn = memory_db();
        let category = Category::new("u1", "Groceries", TransactionKind::Expense);
        assert!(insert_category(&conn, &category).unwrap());

        // reused id with a fresh name trips the primary key, not the name check
        let mut clash = category.clone();
        clash.name = "Rent".to_string();
        assert!(insert_category(&conn, &clash).is_err());
    }

    #[test]
    fn test_category_roundtrip_and_duplicate_name() {
        let conn = memory_db();
        let category = Category::with_display("u1", "Groceries", TransactionKind::Expense, "#4CAF50", "🛒");

        assert!(insert_category(&conn, &category).unwrap());
        assert!(!insert_category(&conn, &Category::new("u1", "Groceries", TransactionKind::Income)).unwrap());
        // same name, other user is fine
        assert!(insert_category(&conn, &Category::new("u2", "Groceries", TransactionKind::Expense)).unwrap());

        let loaded = get_category(&conn, "u1", &category.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Groceries");
        assert_eq!(loaded.kind, TransactionKind::Expense);
        assert_eq!(loaded.icon, "🛒");

        assert!(get_category(&conn, "u2", &category.id).unwrap().is_none());
    }

    #[test]
    fn test_get_categories_filters_and_orders() {
        let conn = memory_db();
        for (name, kind) in [
            ("Shopping", TransactionKind::Expense),
            ("Salary", TransactionKind::Income),
            ("Bills", TransactionKind::Expense),
        ] {
            insert_category(&conn, &Category::new("u1", name, kind)).unwrap();
        }

        let all: Vec<String> = get_categories(&conn, "u1", None)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(all, vec!["Bills", "Shopping", "Salary"]);

        let income = get_categories(&conn, "u1", Some(TransactionKind::Income)).unwrap();
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].name, "Salary");
    }

    #[test]
    fn test_candidates_keep_creation_order() {
        let conn = memory_db();
        let base = Utc::now();
        for (offset, name) in ["Shopping", "Bills", "Food & Dining"].iter().enumerate() {
            let mut category = Category::new("u1", name, TransactionKind::Expense);
            category.created_at = base + Duration::seconds(offset as i64);
            insert_category(&conn, &category).unwrap();
        }

        let names: Vec<String> = get_candidate_categories(&conn, "u1", TransactionKind::Expense)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Shopping", "Bills", "Food & Dining"]);
    }

    #[test]
    fn test_delete_category() {
        let conn = memory_db();
        let category = Category::new("u1", "Bills", TransactionKind::Expense);
        insert_category(&conn, &category).unwrap();

        assert!(!delete_category(&conn, "u2", &category.id).unwrap());
        assert!(delete_category(&conn, "u1", &category.id).unwrap());
        assert!(get_category(&conn, "u1", &category.id).unwrap().is_none());
    }

    #[test]
    fn test_feedback_stats() {
        let conn = memory_db();
        for record in [
            feedback("u1", "Food & Dining", "Food & Dining"),
            feedback("u1", "Bills", "Transportation"),
            feedback("u1", "Bills", "Shopping"),
            feedback("u1", "Shopping", "Entertainment"),
            feedback("u2", "Bills", "Travel"),
        ] {
            insert_feedback(&conn, &record).unwrap();
        }

        let stats = get_feedback_stats(&conn, "u1").unwrap();
        assert_eq!(stats.total_feedback, 4);
        assert_eq!(stats.correct_predictions, 1);
        assert_eq!(stats.incorrect_predictions, 3);
        assert_eq!(stats.accuracy, 25.0);
        assert_eq!(stats.top_incorrect_suggestions[0].category, "Bills");
        assert_eq!(stats.top_incorrect_suggestions[0].count, 2);
        assert_eq!(stats.top_incorrect_suggestions.len(), 2);
    }

    #[test]
    fn test_feedback_stats_empty() {
        let conn = memory_db();
        let stats = get_feedback_stats(&conn, "nobody").unwrap();

        assert_eq!(stats, FeedbackStats::new(0, 0, 0, vec![]));
    }

    #[test]
    fn test_recent_feedback_newest_first() {
        let conn = memory_db();
        let base = Utc::now();
        for i in 0..25 {
            let mut record = feedback("u1", "Bills", "Bills");
            record.original_description = format!("entry {}", i);
            record.timestamp = base + Duration::seconds(i);
            insert_feedback(&conn, &record).unwrap();
        }

        let recent = get_recent_feedback(&conn, "u1", 20).unwrap();
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0].original_description, "entry 24");
        assert_eq!(recent[19].original_description, "entry 5");
        assert!(recent[0].is_correct);
    }
}
