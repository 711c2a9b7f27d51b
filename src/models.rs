use crate::database::Database;

/// Bot state shared across all commands and handlers
#[derive(Clone)]
pub struct Data {
    /// Database connection, doubling as the scheduler's task store
    pub db: Database,
}

impl Data {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
