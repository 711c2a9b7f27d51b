use sqlx::Error as SqlxError;

use super::Database;

impl Database {
    /// Record the outcome of one roulette round
    pub async fn record_roulette_round(&self, user_id: i64, win: bool) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            INSERT INTO roulette_rounds (user_id, win)
            VALUES ($1, $2)
            "#,
        )
        .bind(user_id)
        .bind(win)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// All recorded rounds in play order, for streak computation
    pub async fn roulette_results(&self) -> Result<Vec<(i64, bool)>, SqlxError> {
        sqlx::query_as(
            r#"
            SELECT user_id, win
            FROM roulette_rounds
            ORDER BY played_at, round_id
            "#,
        )
        .fetch_all(self.pool())
        .await
    }
}
