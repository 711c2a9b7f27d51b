use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, CreateMessage, UserId};
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::TaskError;
use crate::scheduler::{Task, TaskHandler};

/// Clears expired roulette lockouts; the task subject is the locked-out
/// player.
///
/// The lockout itself is enforced by the pending row (the command refuses to
/// play while one exists), so the only work left at expiry is a courtesy
/// ping - and the row must clear even when that ping cannot be delivered,
/// or a player with closed DMs would stay locked out forever.
pub struct RouletteTimeoutHandler {
    http: Arc<serenity::Http>,
}

impl RouletteTimeoutHandler {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TaskHandler for RouletteTimeoutHandler {
    async fn handle(&self, task: &Task) -> Result<(), TaskError> {
        let user = UserId::new(task.subject_id as u64);

        let delivery = async {
            let dm = user.create_dm_channel(&self.http).await?;
            dm.id
                .send_message(
                    &self.http,
                    CreateMessage::new()
                        .content("Your roulette timeout has expired - feel free to tempt fate again."),
                )
                .await
        };

        match delivery.await {
            Ok(_) => info!("Roulette timeout lifted for user {}", task.subject_id),
            Err(e) => warn!(
                "Roulette timeout lifted for user {}, but they could not be notified: {}",
                task.subject_id, e
            ),
        }

        Ok(())
    }
}
