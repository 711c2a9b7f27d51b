use chrono::Utc;
use poise::serenity_prelude::{EditMember, Mentionable, Timestamp};
use rand::Rng;
use tracing::{info, warn};

use crate::constants::ROULETTE_TIMEOUT;
use crate::models::{Context, Error};
use crate::scheduler::{NewTask, TaskKind, TaskStore};
use crate::utils::datetime::{TimestampStyle, discord_timestamp};
use crate::utils::streak_logic::{summarize_streaks, win_message};

/// Do you feel lucky?
#[poise::command(slash_command, guild_only)]
pub async fn roulette(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let user_id = ctx.author().id.get() as i64;
    let now = Utc::now();

    // A pending lockout row blocks play until it has actually run out;
    // the poller clears it shortly after
    if let Some(task) = ctx
        .data()
        .db
        .pending_task_for(TaskKind::RouletteTimeout, user_id)
        .await?
    {
        if task.expires_at > now {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "You have been timed out from using this command. \
                         You will be able to use it again {}",
                        discord_timestamp(task.expires_at, TimestampStyle::Relative)
                    ))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    }

    let win = rand::thread_rng().gen_range(1..=6) != 6;
    ctx.data().db.record_roulette_round(user_id, win).await?;

    if !win {
        let until = now + ROULETTE_TIMEOUT;
        let mention = ctx.author().id.mention();

        // Prefer a real platform timeout; mods and admins can't be timed
        // out, so those get a stored lockout enforced by this command
        let timed_out = match Timestamp::from_unix_timestamp(until.timestamp()) {
            Ok(timestamp) => guild_id
                .edit_member(
                    ctx.serenity_context(),
                    ctx.author().id,
                    EditMember::new().disable_communication_until_datetime(timestamp),
                )
                .await
                .is_ok(),
            Err(_) => false,
        };

        let lose_message = if timed_out {
            format!(
                "Not all risks pay off, {}. Your streak has been reset \
                 and you have been timed out.",
                mention
            )
        } else {
            info!("Could not time out {}, storing a command lockout", ctx.author().name);
            if let Err(e) = ctx
                .data()
                .db
                .insert(NewTask::new(TaskKind::RouletteTimeout, user_id, until))
                .await
            {
                warn!("Failed to store roulette lockout for user {}: {}", user_id, e);
            }
            format!(
                "Not all risks pay off, {}. Your streak has been reset \
                 and you have been timed out from using this command.",
                mention
            )
        };

        ctx.say(lose_message).await?;
        return Ok(());
    }

    let rounds = ctx.data().db.roulette_results().await?;
    let summary = summarize_streaks(&rounds, user_id);
    ctx.say(win_message(&ctx.author().id.mention().to_string(), &summary))
        .await?;

    Ok(())
}
