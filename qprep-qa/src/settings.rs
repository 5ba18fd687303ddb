//! Engine tunables loaded from the `settings` table
//!
//! Database-first configuration: every tunable has a built-in default,
//! and missing rows are initialized with that default and written back
//! so operators can see (and edit) the effective values.

use qprep_common::{Error, Result};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::info;

/// Runtime settings for the assembly engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound on questions taken from a single reading passage
    pub max_questions_per_passage: usize,

    /// Smallest passage group worth serving as a unit
    pub min_passage_group_size: usize,

    /// Soft deadline for one assembly request; on expiry the engine
    /// keeps what it has and proceeds to arrangement
    pub assembly_deadline_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_questions_per_passage: 5,
            min_passage_group_size: 3,
            assembly_deadline_ms: 10_000,
        }
    }
}

impl EngineSettings {
    /// Load engine settings from the database.
    ///
    /// For each setting:
    /// 1. Try to read from the `settings` table
    /// 2. If missing or NULL, use the built-in default
    /// 3. Write the default back for consistency
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let defaults = Self::default();

        let settings = Self {
            max_questions_per_passage: get_setting(
                pool,
                "max_questions_per_passage",
                defaults.max_questions_per_passage as i64,
            )
            .await? as usize,
            min_passage_group_size: get_setting(
                pool,
                "min_passage_group_size",
                defaults.min_passage_group_size as i64,
            )
            .await? as usize,
            assembly_deadline_ms: get_setting(
                pool,
                "assembly_deadline_ms",
                defaults.assembly_deadline_ms as i64,
            )
            .await? as u64,
        };

        if settings.max_questions_per_passage == 0 {
            return Err(Error::Config(
                "max_questions_per_passage must be at least 1".to_string(),
            ));
        }
        if settings.min_passage_group_size == 0 {
            return Err(Error::Config(
                "min_passage_group_size must be at least 1".to_string(),
            ));
        }

        info!(
            max_questions_per_passage = settings.max_questions_per_passage,
            min_passage_group_size = settings.min_passage_group_size,
            assembly_deadline_ms = settings.assembly_deadline_ms,
            "Loaded engine settings"
        );
        Ok(settings)
    }

    /// Assembly deadline as a Duration
    pub fn assembly_deadline(&self) -> Duration {
        Duration::from_millis(self.assembly_deadline_ms)
    }
}

/// Read one integer setting, writing the default back when missing or NULL.
async fn get_setting(pool: &SqlitePool, key: &str, default: i64) -> Result<i64> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match value.flatten() {
        Some(raw) => raw.parse::<i64>().map_err(|e| {
            Error::Config(format!("Setting '{}' has non-integer value '{}': {}", key, raw, e))
        }),
        None => {
            info!("Setting '{}' not found, using default: {}", key, default);
            sqlx::query(
                "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
            )
            .bind(key)
            .bind(default.to_string())
            .execute(pool)
            .await?;
            Ok(default)
        }
    }
}
