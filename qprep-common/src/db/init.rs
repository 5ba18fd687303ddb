//! Database initialization
//!
//! Creates the corpus database on first run. Table creation is
//! idempotent so every service can call it at startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL allows concurrent readers while ingestion writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    // Idempotent - safe to call multiple times
    create_questions_table(&pool).await?;
    create_settings_table(&pool).await?;

    Ok(pool)
}

/// Create the questions table
///
/// Stores the ingested question corpus. `options` holds a JSON object
/// mapping answer labels to option text. Passage columns are NULL for
/// everything except reading comprehension.
pub async fn create_questions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            guid TEXT PRIMARY KEY,
            question_type TEXT NOT NULL CHECK (question_type IN ('PS', 'DS', 'CR', 'RC')),
            category TEXT NOT NULL CHECK (category IN ('quantitative', 'verbal')),
            difficulty TEXT CHECK (difficulty IS NULL OR difficulty IN ('Sub 500', '500-600', '600-700', '700+')),
            question_text TEXT NOT NULL,
            options TEXT NOT NULL DEFAULT '{}',
            correct_answer TEXT,
            explanation TEXT,
            passage_id TEXT,
            passage_text TEXT,
            sequence_in_passage INTEGER,
            topic TEXT,
            source TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (sequence_in_passage IS NULL OR sequence_in_passage >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_questions_type ON questions(question_type)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_questions_passage ON questions(passage_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_questions_difficulty ON questions(difficulty)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores service configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
