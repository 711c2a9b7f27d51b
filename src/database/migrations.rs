use super::Database;
use sqlx::Error as SqlxError;

impl Database {
    /// Run database migrations to create types and tables
    pub(super) async fn run_migrations(&self) -> Result<(), SqlxError> {
        self.create_task_kind_type().await?;
        self.create_task_table().await?;
        self.create_burger_table().await?;
        self.create_roulette_table().await?;
        Ok(())
    }

    async fn create_task_kind_type(&self) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            DO $$
            BEGIN
                IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'task_kind') THEN
                    CREATE TYPE task_kind AS ENUM (
                        'reminder',
                        'giveaway_end',
                        'repost_penalty',
                        'roulette_timeout',
                        'burger_rot'
                    );
                END IF;
            END $$;
            "#,
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn create_task_table(&self) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                task_id SERIAL PRIMARY KEY,
                kind task_kind NOT NULL,
                subject_id BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                expires_at TIMESTAMPTZ NOT NULL,
                payload JSONB,
                processed BOOLEAN NOT NULL DEFAULT FALSE
            )
            "#,
        )
        .execute(self.pool())
        .await?;

        // The poller only ever scans unprocessed rows of one kind
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS tasks_due_idx
            ON tasks (kind, expires_at)
            WHERE NOT processed
            "#,
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn create_burger_table(&self) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS burger_transfers (
                transfer_id SERIAL PRIMARY KEY,
                giver_id BIGINT,
                recipient_id BIGINT,
                transferred_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                reason TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn create_roulette_table(&self) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS roulette_rounds (
                round_id SERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                played_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                win BOOLEAN NOT NULL
            )
            "#,
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
