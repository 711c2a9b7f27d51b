use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{
    self as serenity, ChannelId, Colour, CreateEmbed, CreateEmbedFooter, CreateMessage,
    EditMessage, GuildId, Message, MessageId, ReactionType, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::constants::{GIVEAWAY_COLOR, GIVEAWAY_EMOJI};
use crate::errors::TaskError;
use crate::scheduler::{Task, TaskHandler};
use crate::utils::datetime::{TimestampStyle, discord_timestamp};
use crate::utils::giveaway_logic::{draw_winners, eligible_entrants, finish_announcement};
use crate::utils::lookup::message_link;

/// Stored with each giveaway task; the task subject is the giveaway message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiveawayPayload {
    pub guild_id: u64,
    pub channel_id: u64,
    pub winner_count: u32,
    pub title: String,
    pub host_id: u64,
}

/// Resolves expired giveaways: draws winners from the 🎉 reactors, rewrites
/// the embed and announces the result
pub struct GiveawayEndHandler {
    http: Arc<serenity::Http>,
    /// The bot reacts to its own giveaways to seed the emoji; its entry
    /// never counts
    bot_id: UserId,
}

impl GiveawayEndHandler {
    pub fn new(http: Arc<serenity::Http>, bot_id: UserId) -> Self {
        Self { http, bot_id }
    }

    /// Everyone who reacted with the giveaway emoji, across pagination
    async fn entrants(&self, message: &Message) -> Result<Vec<UserId>, TaskError> {
        let emoji = ReactionType::Unicode(GIVEAWAY_EMOJI.to_string());
        let mut entrants: Vec<UserId> = Vec::new();
        let mut after: Option<UserId> = None;

        loop {
            let batch = message
                .reaction_users(&self.http, emoji.clone(), Some(100), after)
                .await
                .map_err(|e| TaskError::from_discord(e, format!("message {}", message.id)))?;

            let batch_len = batch.len();
            entrants.extend(batch.into_iter().map(|user| user.id));

            if batch_len < 100 {
                break;
            }
            after = entrants.last().copied();
        }

        Ok(entrants)
    }
}

#[async_trait]
impl TaskHandler for GiveawayEndHandler {
    async fn handle(&self, task: &Task) -> Result<(), TaskError> {
        let payload: GiveawayPayload = task.decode_payload()?;
        let channel = ChannelId::new(payload.channel_id);
        let message_id = MessageId::new(task.subject_id as u64);

        // A deleted giveaway message can never be resolved
        let message = channel
            .message(&self.http, message_id)
            .await
            .map_err(|e| TaskError::from_discord(e, format!("giveaway message {}", message_id)))?;

        let entrants = eligible_entrants(self.entrants(&message).await?, &self.bot_id);
        let winners = draw_winners(
            &entrants,
            payload.winner_count as usize,
            &mut rand::thread_rng(),
        );
        let mentions: Vec<String> = winners.iter().map(|id| format!("<@{}>", id)).collect();

        info!(
            "Giveaway {} finished with {} entrants, drew {} winner(s)",
            message_id,
            entrants.len(),
            winners.len()
        );

        let embed = finished_embed(&payload, &mentions);
        channel
            .edit_message(&self.http, message_id, EditMessage::new().embed(embed))
            .await
            .map_err(|e| TaskError::from_discord(e, format!("giveaway message {}", message_id)))?;

        let jump_url = message_link(GuildId::new(payload.guild_id), channel, message_id);
        let announcement = finish_announcement(
            &jump_url,
            &mentions,
            &payload.title,
            &format!("<@{}>", payload.host_id),
        );
        channel
            .send_message(&self.http, CreateMessage::new().content(announcement))
            .await
            .map_err(|e| TaskError::from_discord(e, format!("channel {}", channel)))?;

        Ok(())
    }
}

/// The embed posted when a giveaway starts
pub fn giveaway_embed(
    title: &str,
    host_id: UserId,
    winner_count: u32,
    ends_at: DateTime<Utc>,
) -> CreateEmbed {
    CreateEmbed::new()
        .colour(Colour::new(GIVEAWAY_COLOR))
        .title(format!("🎉   {} GIVEAWAY   🎉", title.to_uppercase()))
        .description(format!(
            "React with 🎉 to enter!\nEnds {}",
            discord_timestamp(ends_at, TimestampStyle::Relative)
        ))
        .field("Hosted by", format!("<@{}>", host_id), true)
        .footer(CreateEmbedFooter::new(winner_footer(winner_count, "Ends")))
        .timestamp(Timestamp::from_unix_timestamp(ends_at.timestamp()).unwrap_or_else(|_| Timestamp::now()))
}

/// The embed a giveaway is rewritten into once it finishes
fn finished_embed(payload: &GiveawayPayload, winner_mentions: &[String]) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .colour(Colour::new(GIVEAWAY_COLOR))
        .title(format!("🎉   {} GIVEAWAY   🎉", payload.title.to_uppercase()))
        .description("The giveaway has finished!")
        .field("Hosted by", format!("<@{}>", payload.host_id), true)
        .footer(CreateEmbedFooter::new(winner_footer(
            payload.winner_count,
            "Ended",
        )))
        .timestamp(Timestamp::now());

    for (index, mention) in winner_mentions.iter().enumerate() {
        embed = embed.field(format!("Winner #{}", index + 1), mention.clone(), false);
    }
    for index in winner_mentions.len()..payload.winner_count as usize {
        embed = embed.field(format!("Winner #{}", index + 1), "None", false);
    }

    embed
}

/// "3 winners  •  Ends" / "1 winner  •  Ended"
fn winner_footer(winner_count: u32, verb: &str) -> String {
    let plural = if winner_count == 1 { "" } else { "s" };
    format!("{} winner{}  •  {}", winner_count, plural, verb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winner_footer() {
        assert_eq!(winner_footer(1, "Ends"), "1 winner  •  Ends");
        assert_eq!(winner_footer(3, "Ended"), "3 winners  •  Ended");
    }
}
