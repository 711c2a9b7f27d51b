use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tracing::info;

use crate::models::{Context, Error};
use crate::scheduler::{NewTask, TaskKind, TaskStore};
use crate::tasks::{ReminderLocation, ReminderPayload};
use crate::utils::datetime::{TimestampStyle, discord_timestamp};

/// Commands for setting reminders
#[poise::command(slash_command, guild_only, subcommands("remindme_in", "remindme_at"))]
pub async fn remindme(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Reminds you after a specified time
#[poise::command(slash_command, rename = "in")]
pub async fn remindme_in(
    ctx: Context<'_>,
    #[description = "Days until the reminder"] days: u32,
    #[description = "Hours until the reminder"] hours: u32,
    #[description = "Minutes until the reminder"] minutes: u32,
    #[description = "A message for the reminder"] message: String,
    #[description = "Where to send the reminder"] location: Option<ReminderLocation>,
) -> Result<(), Error> {
    if days + hours + minutes == 0 {
        ctx.send(
            poise::CreateReply::default()
                .content("Invalid time format, please try again")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let expires_at = Utc::now()
        + TimeDelta::days(days as i64)
        + TimeDelta::hours(hours as i64)
        + TimeDelta::minutes(minutes as i64);

    schedule_reminder(
        ctx,
        expires_at,
        message,
        location.unwrap_or(ReminderLocation::Channel),
    )
    .await
}

/// Reminds you at a specified date and time
#[poise::command(slash_command, rename = "at")]
pub async fn remindme_at(
    ctx: Context<'_>,
    #[description = "Year of the reminder"] year: i32,
    #[description = "Month of the reminder"] month: u32,
    #[description = "Day of the reminder"] day: u32,
    #[description = "Hour of the reminder"] hour: u32,
    #[description = "Minute of the reminder"] minute: u32,
    #[description = "A message for the reminder"] message: String,
    #[description = "Where to send the reminder"] location: Option<ReminderLocation>,
) -> Result<(), Error> {
    let now = Utc::now();

    let Some(expires_at) = Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).single() else {
        ctx.send(
            poise::CreateReply::default()
                .content("Please input a valid date and time.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    if expires_at < now {
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "You must choose a time that's in the future (current bot time is {}).",
                    now.format("%H:%M")
                ))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    schedule_reminder(
        ctx,
        expires_at,
        message,
        location.unwrap_or(ReminderLocation::Channel),
    )
    .await
}

/// Confirm the reminder and store it for the poller
async fn schedule_reminder(
    ctx: Context<'_>,
    expires_at: DateTime<Utc>,
    message: String,
    location: ReminderLocation,
) -> Result<(), Error> {
    info!("Creating reminder for {}", ctx.author().name);

    let confirmation = ctx
        .say(format!(
            "{}: Your reminder has been registered and you will be reminded on {}.",
            discord_timestamp(Utc::now(), TimestampStyle::ShortTime),
            discord_timestamp(expires_at, TimestampStyle::DateTime),
        ))
        .await?;
    let confirmation_url = confirmation
        .message()
        .await
        .ok()
        .map(|message| message.link());

    let payload = ReminderPayload {
        message,
        channel_id: ctx.channel_id().get(),
        location,
        confirmation_url,
    };
    ctx.data()
        .db
        .insert(
            NewTask::new(
                TaskKind::Reminder,
                ctx.author().id.get() as i64,
                expires_at,
            )
            .with_payload(serde_json::to_value(&payload)?),
        )
        .await?;

    Ok(())
}
