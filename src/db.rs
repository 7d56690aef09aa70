use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::error::AppResult;
use crate::models::{HistoryEntry, Label, PersonalityResult, UserId};
use crate::store::ResultStore;

pub async fn init_db(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Demo results to insert for a user who already has `existing` results.
/// Users with any history are left alone so reseeding is a no-op.
fn pending_seed_results(existing: i64, labels: &[Label]) -> &[Label] {
    if existing > 0 {
        &[]
    } else {
        labels
    }
}

/// Demo users with a locked password marker; logins go through the auth service.
pub async fn seed(pool: &PgPool) -> AppResult<usize> {
    let users = vec![
        ("amina.rahman", vec![Label::Strategist, Label::Observer]),
        ("yusuf.karim", vec![Label::Follower]),
        ("leila.haddad", vec![Label::Responder, Label::Explorer, Label::Follower]),
    ];

    let mut inserted = 0usize;
    for (username, labels) in users {
        let user_id: i64 = sqlx::query(
            r#"
            INSERT INTO crowd_pulse.users (username, password)
            VALUES ($1, '!')
            ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
            RETURNING id
            "#,
        )
        .bind(username)
        .fetch_one(pool)
        .await?
        .get("id");

        let existing: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM crowd_pulse.quiz_results WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?
        .get("count");

        for label in pending_seed_results(existing, &labels) {
            sqlx::query("INSERT INTO crowd_pulse.quiz_results (user_id, result) VALUES ($1, $2)")
                .bind(user_id)
                .bind(label.as_str())
                .execute(pool)
                .await?;
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_label(raw: &str) -> Option<Label> {
    match raw.parse() {
        Ok(label) => Some(label),
        Err(err) => {
            tracing::warn!(%err, "ignoring stored result with unknown label");
            None
        }
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn append_result(&self, user_id: UserId, label: Label) -> AppResult<PersonalityResult> {
        let row = sqlx::query(
            r#"
            INSERT INTO crowd_pulse.quiz_results (user_id, result)
            VALUES ($1, $2)
            RETURNING id, created_at
            "#,
        )
        .bind(user_id.0)
        .bind(label.as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %user_id, label = %label, "quiz result stored");
        Ok(PersonalityResult {
            id: row.get("id"),
            user_id,
            label,
            created_at: row.get("created_at"),
        })
    }

    async fn list_history(&self, user_id: UserId) -> AppResult<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT result, created_at
            FROM crowd_pulse.quiz_results
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut history = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.get("result");
            let created_at: DateTime<Utc> = row.get("created_at");
            if let Some(label) = decode_label(&raw) {
                history.push(HistoryEntry { label, created_at });
            }
        }
        Ok(history)
    }

    async fn label_counts(&self) -> AppResult<BTreeMap<Label, i64>> {
        let rows = sqlx::query(
            "SELECT result, COUNT(*) AS count FROM crowd_pulse.quiz_results GROUP BY result",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let raw: String = row.get("result");
            let count: i64 = row.get("count");
            if let Some(label) = decode_label(&raw) {
                counts.insert(label, count);
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_twice_adds_no_results() {
        let labels = [Label::Strategist, Label::Observer];
        assert_eq!(pending_seed_results(0, &labels), &labels);
        assert!(pending_seed_results(2, &labels).is_empty());
    }

    #[test]
    fn unknown_stored_labels_are_skipped() {
        assert_eq!(decode_label("Observer"), Some(Label::Observer));
        assert_eq!(decode_label("Leader"), None);
    }
}
