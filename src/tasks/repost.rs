use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, GuildId, RoleId, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::errors::TaskError;
use crate::scheduler::{Task, TaskHandler};

/// Stored with each repost penalty task; the task subject is the reposter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepostPayload {
    pub guild_id: u64,
    /// Penalty role, resolved when the penalty was handed out
    pub role_id: u64,
}

/// Lifts expired repost penalties by taking the role back
pub struct RepostPenaltyHandler {
    http: Arc<serenity::Http>,
}

impl RepostPenaltyHandler {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TaskHandler for RepostPenaltyHandler {
    async fn handle(&self, task: &Task) -> Result<(), TaskError> {
        let payload: RepostPayload = task.decode_payload()?;

        let member = GuildId::new(payload.guild_id)
            .member(&self.http, UserId::new(task.subject_id as u64))
            .await
            .map_err(|e| TaskError::from_discord(e, format!("member {}", task.subject_id)))?;

        // Removing a role the member already lost is a success for Discord
        // too, which keeps retries harmless
        member
            .remove_role(&self.http, RoleId::new(payload.role_id))
            .await
            .map_err(|e| TaskError::from_discord(e, format!("role {}", payload.role_id)))?;

        info!("Repost penalty expired for user {}", task.subject_id);
        Ok(())
    }
}
