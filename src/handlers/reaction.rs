use chrono::{DateTime, Utc};
use poise::serenity_prelude::{self as serenity, Reaction, ReactionType};
use tracing::{info, warn};

use crate::constants::{
    REPOST_EMOJI_NAME, REPOST_PENALTY_DURATION, REPOST_REACTION_THRESHOLD, REPOST_ROLE_NAME,
};
use crate::models::Data;
use crate::scheduler::{NewTask, TaskKind, TaskStore};
use crate::tasks::RepostPayload;
use crate::utils::lookup::find_role;

/// Watch for REE reactions piling up on fresh messages and hand out the
/// repost penalty once they cross the threshold.
///
/// The role is (re-)applied on every crossing reaction - that is idempotent -
/// but only one penalty task may be pending per user at a time, so piling
/// more reactions onto the same repost never extends the sentence.
pub async fn handle_reaction_add(ctx: &serenity::Context, reaction: &Reaction, data: &Data) {
    if !is_repost_emoji(emoji_name(&reaction.emoji)) {
        return;
    }
    let Some(guild_id) = reaction.guild_id else {
        return;
    };

    let message = match reaction.message(&ctx.http).await {
        Ok(message) => message,
        Err(e) => {
            warn!("Failed to fetch reacted message: {}", e);
            return;
        }
    };
    if message.author.bot {
        return;
    }

    let posted_at = message.id.created_at().unix_timestamp();
    let age_secs = Utc::now().timestamp() - posted_at;
    if !within_penalty_window(age_secs) {
        info!("Message {} is too old to count as a repost - ignoring", message.id);
        return;
    }

    let rees = message
        .reactions
        .iter()
        .find(|reaction| is_repost_emoji(emoji_name(&reaction.reaction_type)))
        .map(|reaction| reaction.count)
        .unwrap_or(0);
    if !repost_threshold_reached(rees) {
        return;
    }

    info!("Repost threshold reached on message {} by user {}", message.id, message.author.id);

    let role = match find_role(&ctx.http, guild_id, REPOST_ROLE_NAME).await {
        Ok(Some(role)) => role,
        Ok(None) => {
            warn!("Role '{}' does not exist in guild {}", REPOST_ROLE_NAME, guild_id);
            return;
        }
        Err(e) => {
            warn!("Failed to look up role '{}': {}", REPOST_ROLE_NAME, e);
            return;
        }
    };

    let member = match guild_id.member(&ctx.http, message.author.id).await {
        Ok(member) => member,
        Err(e) => {
            warn!("Failed to fetch member {}: {}", message.author.id, e);
            return;
        }
    };
    if let Err(e) = member.add_role(&ctx.http, role.id).await {
        warn!("Failed to add role '{}' to user {}: {}", REPOST_ROLE_NAME, member.user.id, e);
        return;
    }

    let author_id = message.author.id.get() as i64;
    match data.db.pending_task_for(TaskKind::RepostPenalty, author_id).await {
        Ok(Some(_)) => {
            // Sentence already running
        }
        Ok(None) => {
            let expires_at = DateTime::from_timestamp(posted_at, 0).unwrap_or_else(Utc::now)
                + REPOST_PENALTY_DURATION;
            let payload = RepostPayload {
                guild_id: guild_id.get(),
                role_id: role.id.get(),
            };
            let task = match serde_json::to_value(&payload) {
                Ok(value) => {
                    NewTask::new(TaskKind::RepostPenalty, author_id, expires_at).with_payload(value)
                }
                Err(e) => {
                    warn!("Failed to serialize repost payload: {}", e);
                    return;
                }
            };

            match data.db.insert(task).await {
                Ok(_) => info!("Repost penalty scheduled for user {}", author_id),
                Err(e) => warn!("Failed to schedule repost penalty: {}", e),
            }
        }
        Err(e) => warn!("Failed to check for a pending repost penalty: {}", e),
    }
}

fn emoji_name(emoji: &ReactionType) -> Option<&str> {
    match emoji {
        ReactionType::Custom { name, .. } => name.as_deref(),
        _ => None,
    }
}

/// Whether a custom emoji name marks a repost
fn is_repost_emoji(name: Option<&str>) -> bool {
    name == Some(REPOST_EMOJI_NAME)
}

/// Reactions on old messages don't count - a third of the penalty duration
/// is the cutoff, so a penalty always outlives the message's infamy
fn within_penalty_window(age_secs: i64) -> bool {
    age_secs <= REPOST_PENALTY_DURATION.num_seconds() / 3
}

fn repost_threshold_reached(count: u64) -> bool {
    count >= REPOST_REACTION_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_repost_emoji() {
        assert!(is_repost_emoji(Some("FEELSREEE")));
        assert!(!is_repost_emoji(Some("FEELSOK")));
        assert!(!is_repost_emoji(None));
    }

    #[test]
    fn test_within_penalty_window() {
        // A third of one day
        assert!(within_penalty_window(0));
        assert!(within_penalty_window(8 * 3600));
        assert!(!within_penalty_window(8 * 3600 + 1));
    }

    #[test]
    fn test_repost_threshold() {
        assert!(!repost_threshold_reached(3));
        assert!(repost_threshold_reached(4));
        assert!(repost_threshold_reached(10));
    }
}
