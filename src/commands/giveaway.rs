use chrono::{TimeDelta, Utc};
use poise::serenity_prelude::{CreateMessage, Mentionable, ReactionType};
use tracing::info;

use crate::constants::{GIVEAWAY_CHANNEL_NAME, GIVEAWAY_EMOJI};
use crate::models::{Context, Error};
use crate::scheduler::{NewTask, TaskKind, TaskStore};
use crate::tasks::{GiveawayPayload, giveaway_embed};
use crate::utils::lookup::find_text_channel;

/// Start a giveaway in the #giveaways channel
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn giveaway(
    ctx: Context<'_>,
    #[description = "Days until the giveaway finishes"] days: u32,
    #[description = "Hours until the giveaway finishes"] hours: u32,
    #[description = "Minutes until the giveaway finishes"] minutes: u32,
    #[description = "Number of winners"]
    #[min = 1]
    winners: u32,
    #[description = "The title of your giveaway"] title: String,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    if days + hours + minutes == 0 {
        ctx.send(
            poise::CreateReply::default()
                .content("Invalid time format, please try again")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let http = &ctx.serenity_context().http;
    let Some(channel) = find_text_channel(http, guild_id, GIVEAWAY_CHANNEL_NAME).await? else {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("There is no #{} channel to post in.", GIVEAWAY_CHANNEL_NAME))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    let ends_at = Utc::now()
        + TimeDelta::days(days as i64)
        + TimeDelta::hours(hours as i64)
        + TimeDelta::minutes(minutes as i64);

    let embed = giveaway_embed(&title, ctx.author().id, winners, ends_at);
    let message = channel
        .id
        .send_message(http, CreateMessage::new().embed(embed))
        .await?;
    message
        .react(http, ReactionType::Unicode(GIVEAWAY_EMOJI.to_string()))
        .await?;

    let payload = GiveawayPayload {
        guild_id: guild_id.get(),
        channel_id: channel.id.get(),
        winner_count: winners,
        title,
        host_id: ctx.author().id.get(),
    };
    ctx.data()
        .db
        .insert(
            NewTask::new(TaskKind::GiveawayEnd, message.id.get() as i64, ends_at)
                .with_payload(serde_json::to_value(&payload)?),
        )
        .await?;

    info!("Giveaway {} started by {}", message.id, ctx.author().name);
    ctx.send(
        poise::CreateReply::default()
            .content(format!("Giveaway started in {}!", channel.id.mention()))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}
