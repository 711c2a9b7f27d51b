use std::time::Duration;

use chrono::TimeDelta;

/// How often reminder tasks are polled
pub const REMINDER_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How often giveaway tasks are polled
pub const GIVEAWAY_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How often repost penalty tasks are polled
pub const REPOST_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// How often roulette timeout tasks are polled
pub const ROULETTE_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// How often burger rot tasks are polled
pub const BURGER_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// How long the repost penalty role sticks to a reposter
pub const REPOST_PENALTY_DURATION: TimeDelta = TimeDelta::days(1);

/// Number of REE reactions needed to mark a message as a repost
pub const REPOST_REACTION_THRESHOLD: u64 = 4;

/// Name of the reaction emoji that marks a repost
pub const REPOST_EMOJI_NAME: &str = "FEELSREEE";

/// Role assigned to users who repost memes
pub const REPOST_ROLE_NAME: &str = "REE-poster";

/// How long a roulette loss locks a player out
pub const ROULETTE_TIMEOUT: TimeDelta = TimeDelta::minutes(30);

/// How long the burger can be held before it starts to rot
pub const BURGER_TIMEOUT: TimeDelta = TimeDelta::weeks(1);

/// Minimum time between two yoinks by the same user
pub const YOINK_COOLDOWN: TimeDelta = TimeDelta::days(30);

/// Role held by the current burger owner
pub const BURGER_ROLE_NAME: &str = "Burgered";

/// Channel where giveaways are posted
pub const GIVEAWAY_CHANNEL_NAME: &str = "giveaways";

/// Channel where the burger announces its freedom
pub const GENERAL_CHANNEL_NAME: &str = "general";

/// Reaction used to enter giveaways
pub const GIVEAWAY_EMOJI: &str = "🎉";

/// Embed color for giveaways
pub const GIVEAWAY_COLOR: u32 = 0x58B9FF;

/// Log directive for the application
pub const LOG_DIRECTIVE: &str = "standby_rs=info";
