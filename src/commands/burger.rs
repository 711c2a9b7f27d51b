use chrono::Utc;
use poise::serenity_prelude::{self as serenity, EditRole, GuildId, Mentionable, Role};
use std::sync::Arc;
use tracing::info;

use crate::constants::{BURGER_ROLE_NAME, BURGER_TIMEOUT, GENERAL_CHANNEL_NAME, YOINK_COOLDOWN};
use crate::database::{Database, TransferReason};
use crate::models::{Context, Error};
use crate::scheduler::{NewTask, TaskKind, TaskStore};
use crate::tasks::BurgerPayload;
use crate::utils::datetime::{TimestampStyle, discord_timestamp};
use crate::utils::lookup::{find_role, find_text_channel, role_holders};

/// Burger someone
#[poise::command(slash_command, guild_only)]
pub async fn burger(
    ctx: Context<'_>,
    #[description = "The person you want to burger"] target: serenity::Member,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let http = &ctx.serenity_context().http;
    info!("{} is attempting to burger {}", ctx.author().name, target.user.name);

    let role = ensure_burger_role(http, guild_id).await?;
    let holders = role_holders(http, guild_id, role.id).await?;

    if !holders.iter().any(|member| member.user.id == ctx.author().id) {
        let content = match holders.first() {
            Some(holder) => format!(
                "{} holds the burger - only they may burger others.",
                holder.user.id.mention()
            ),
            None => free_burger_message(http, guild_id).await,
        };
        ctx.send(poise::CreateReply::default().content(content).ephemeral(true))
            .await?;
        return Ok(());
    }

    if target.user.id == ctx.author().id {
        ctx.send(
            poise::CreateReply::default()
                .content("You can't burger yourself - you are already burgered!")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    if target.user.bot {
        ctx.send(
            poise::CreateReply::default()
                .content(
                    "Fool me once, shame on — shame on you. \
                     Fool me — you can't get fooled again.",
                )
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let giver_id = ctx.author().id.get() as i64;
    let recipient_id = target.user.id.get() as i64;

    if let Some(author) = ctx.author_member().await {
        author.remove_role(http, role.id).await?;
    }
    target.add_role(http, role.id).await?;

    ctx.data()
        .db
        .record_burger_transfer(Some(giver_id), Some(recipient_id), TransferReason::Give)
        .await?;
    reschedule_burger_rot(&ctx.data().db, guild_id, &role, Some(giver_id), recipient_id).await?;

    ctx.say(format!("{} has been burgered! 🍔", target.user.id.mention()))
        .await?;

    Ok(())
}

/// Yoink the burger
#[poise::command(slash_command, guild_only)]
pub async fn yoink(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let http = &ctx.serenity_context().http;
    info!("{} is attempting to yoink the burger", ctx.author().name);

    let role = ensure_burger_role(http, guild_id).await?;
    let holders = role_holders(http, guild_id, role.id).await?;

    let Some(holder) = holders.first() else {
        let content = free_burger_message(http, guild_id).await;
        ctx.send(poise::CreateReply::default().content(content).ephemeral(true))
            .await?;
        return Ok(());
    };

    if holder.user.id == ctx.author().id {
        ctx.send(
            poise::CreateReply::default()
                .content("You already hold the burger - there is nothing to yoink.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let yoinker_id = ctx.author().id.get() as i64;
    if let Some(last_yoink) = ctx
        .data()
        .db
        .last_transfer_to(yoinker_id, TransferReason::Yoink)
        .await?
    {
        let next_allowed = last_yoink + YOINK_COOLDOWN;
        if next_allowed > Utc::now() {
            info!("Not enough time has passed since last yoink - disallowing");
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "You have yoinked the burger too recently and cannot \
                         do so again until {}",
                        discord_timestamp(next_allowed, TimestampStyle::DateTime)
                    ))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    }

    let holder_id = holder.user.id.get() as i64;
    holder.remove_role(http, role.id).await?;
    if let Some(author) = ctx.author_member().await {
        author.add_role(http, role.id).await?;
    }

    ctx.data()
        .db
        .record_burger_transfer(Some(holder_id), Some(yoinker_id), TransferReason::Yoink)
        .await?;
    reschedule_burger_rot(&ctx.data().db, guild_id, &role, Some(holder_id), yoinker_id).await?;

    ctx.say(format!(
        "{} has yoinked the burger from {}!",
        ctx.author().id.mention(),
        holder.user.id.mention()
    ))
    .await?;

    Ok(())
}

/// See who previously held the burger
#[poise::command(slash_command, guild_only, rename = "burger-history")]
pub async fn burger_history(ctx: Context<'_>) -> Result<(), Error> {
    let holders = ctx.data().db.last_burger_holders(10).await?;

    if holders.is_empty() {
        ctx.send(
            poise::CreateReply::default()
                .content("The burger has no recorded history yet.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let chain = holders
        .iter()
        .rev()
        .map(|id| format!("<@{}>", id))
        .collect::<Vec<_>>()
        .join(" -> ");
    ctx.send(
        poise::CreateReply::default()
            .content(format!("The last people to hold the burger are {}", chain))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

/// Look up the burger role, creating it on first use
async fn ensure_burger_role(
    http: &Arc<serenity::Http>,
    guild_id: GuildId,
) -> Result<Role, Error> {
    if let Some(role) = find_role(http, guild_id, BURGER_ROLE_NAME).await? {
        return Ok(role);
    }

    info!("Creating the '{}' role", BURGER_ROLE_NAME);
    Ok(guild_id
        .create_role(http, EditRole::new().name(BURGER_ROLE_NAME))
        .await?)
}

/// Point a would-be burgerer at the claim channel
async fn free_burger_message(http: &Arc<serenity::Http>, guild_id: GuildId) -> String {
    let channel = match find_text_channel(http, guild_id, GENERAL_CHANNEL_NAME).await {
        Ok(Some(channel)) => channel.id.mention().to_string(),
        _ => format!("#{}", GENERAL_CHANNEL_NAME),
    };
    format!(
        "The burger is currently free for the taking - to burger others, you \
         must first claim it by answering the question in {}.",
        channel
    )
}

/// Cancel the previous holder's rot timer and start the clock on the new one
async fn reschedule_burger_rot(
    db: &Database,
    guild_id: GuildId,
    role: &Role,
    previous_holder: Option<i64>,
    new_holder: i64,
) -> Result<(), Error> {
    if let Some(previous) = previous_holder {
        if let Some(task) = db.pending_task_for(TaskKind::BurgerRot, previous).await? {
            db.delete(task.id).await?;
        }
    }

    let payload = BurgerPayload {
        guild_id: guild_id.get(),
        role_id: role.id.get(),
    };
    db.insert(
        NewTask::new(TaskKind::BurgerRot, new_holder, Utc::now() + BURGER_TIMEOUT)
            .with_payload(serde_json::to_value(&payload)?),
    )
    .await?;

    Ok(())
}
