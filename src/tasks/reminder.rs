use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{self as serenity, ChannelId, CreateMessage, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::errors::TaskError;
use crate::scheduler::{Task, TaskHandler};
use crate::utils::datetime::{TimestampStyle, discord_timestamp};

/// Where a reminder gets delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, poise::ChoiceParameter)]
#[serde(rename_all = "snake_case")]
pub enum ReminderLocation {
    #[name = "This channel"]
    Channel,
    #[name = "DM"]
    Dm,
    #[name = "Both"]
    Both,
}

/// Stored with each reminder task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub message: String,
    pub channel_id: u64,
    pub location: ReminderLocation,
    /// Jump link to the confirmation message, appended as a reply anchor
    pub confirmation_url: Option<String>,
}

/// Delivers expired reminders; the task subject is the reminded user
pub struct ReminderHandler {
    http: Arc<serenity::Http>,
}

impl ReminderHandler {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TaskHandler for ReminderHandler {
    async fn handle(&self, task: &Task) -> Result<(), TaskError> {
        let payload: ReminderPayload = task.decode_payload()?;

        info!("Delivering reminder to user {}", task.subject_id);
        let content = reminder_message(task.subject_id, task.expires_at, &payload);

        if matches!(payload.location, ReminderLocation::Channel | ReminderLocation::Both) {
            ChannelId::new(payload.channel_id)
                .send_message(&self.http, CreateMessage::new().content(&content))
                .await
                .map_err(|e| {
                    TaskError::from_discord(e, format!("channel {}", payload.channel_id))
                })?;
        }

        if matches!(payload.location, ReminderLocation::Dm | ReminderLocation::Both) {
            let user = UserId::new(task.subject_id as u64);
            let dm = user
                .create_dm_channel(&self.http)
                .await
                .map_err(|e| TaskError::from_discord(e, format!("user {}", task.subject_id)))?;
            dm.id
                .send_message(&self.http, CreateMessage::new().content(&content))
                .await
                .map_err(|e| TaskError::from_discord(e, format!("user {}", task.subject_id)))?;
        }

        Ok(())
    }
}

/// Build the delivered reminder text
fn reminder_message(user_id: i64, expired_at: DateTime<Utc>, payload: &ReminderPayload) -> String {
    let mut content = format!(
        "<@{}> {}: {}",
        user_id,
        discord_timestamp(expired_at, TimestampStyle::DateTime),
        payload.message
    );

    if let Some(url) = &payload.confirmation_url {
        content.push(' ');
        content.push_str(url);
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reminder_message() {
        let expired = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let payload = ReminderPayload {
            message: "water the plants".to_string(),
            channel_id: 2,
            location: ReminderLocation::Channel,
            confirmation_url: None,
        };

        assert_eq!(
            reminder_message(42, expired, &payload),
            "<@42> <t:1700000000:f>: water the plants"
        );
    }

    #[test]
    fn test_reminder_message_appends_confirmation_link() {
        let expired = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let payload = ReminderPayload {
            message: "standup".to_string(),
            channel_id: 2,
            location: ReminderLocation::Both,
            confirmation_url: Some("https://discord.com/channels/1/2/3".to_string()),
        };

        assert!(
            reminder_message(42, expired, &payload)
                .ends_with("standup https://discord.com/channels/1/2/3")
        );
    }

    #[test]
    fn test_payload_roundtrip_through_json() {
        let payload = ReminderPayload {
            message: "hello".to_string(),
            channel_id: 123,
            location: ReminderLocation::Dm,
            confirmation_url: None,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["location"], "dm");
        let back: ReminderPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back.message, "hello");
    }
}
