use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;

use super::Database;

/// Why the burger changed hands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferReason {
    /// The holder passed it on voluntarily
    Give,
    /// Someone stole it
    Yoink,
    /// It rotted in the holder's fridge
    Mold,
    /// It was claimed by answering the trivia question
    Question,
}

impl TransferReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferReason::Give => "give",
            TransferReason::Yoink => "yoink",
            TransferReason::Mold => "mold",
            TransferReason::Question => "question",
        }
    }
}

impl std::fmt::Display for TransferReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Database {
    /// Append a transfer to the burger log.
    ///
    /// `giver_id` is `None` when the burger was unowned (claimed from the
    /// wild); `recipient_id` is `None` when it expired without a taker.
    pub async fn record_burger_transfer(
        &self,
        giver_id: Option<i64>,
        recipient_id: Option<i64>,
        reason: TransferReason,
    ) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            INSERT INTO burger_transfers (giver_id, recipient_id, reason)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(giver_id)
        .bind(recipient_id)
        .bind(reason.as_str())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// When a user last received the burger for the given reason
    pub async fn last_transfer_to(
        &self,
        recipient_id: i64,
        reason: TransferReason,
    ) -> Result<Option<DateTime<Utc>>, SqlxError> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT transferred_at
            FROM burger_transfers
            WHERE recipient_id = $1 AND reason = $2
            ORDER BY transferred_at DESC
            LIMIT 1
            "#,
        )
        .bind(recipient_id)
        .bind(reason.as_str())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|(at,)| at))
    }

    /// When a user last gave the burger away for the given reason
    pub async fn last_transfer_from(
        &self,
        giver_id: i64,
        reason: TransferReason,
    ) -> Result<Option<DateTime<Utc>>, SqlxError> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT transferred_at
            FROM burger_transfers
            WHERE giver_id = $1 AND reason = $2
            ORDER BY transferred_at DESC
            LIMIT 1
            "#,
        )
        .bind(giver_id)
        .bind(reason.as_str())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|(at,)| at))
    }

    /// Number of times a user has let the burger rot
    pub async fn mold_count(&self, user_id: i64) -> Result<i64, SqlxError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM burger_transfers
            WHERE giver_id = $1 AND reason = $2
            "#,
        )
        .bind(user_id)
        .bind(TransferReason::Mold.as_str())
        .fetch_one(self.pool())
        .await?;

        Ok(count)
    }

    /// Ids of the most recent burger holders, newest first
    pub async fn last_burger_holders(&self, limit: i64) -> Result<Vec<i64>, SqlxError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT recipient_id
            FROM burger_transfers
            WHERE recipient_id IS NOT NULL
            ORDER BY transferred_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
