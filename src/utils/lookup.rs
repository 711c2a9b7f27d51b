use poise::serenity_prelude::{
    self as serenity, ChannelId, ChannelType, GuildChannel, GuildId, Member, MessageId, Role,
    RoleId,
};
use std::sync::Arc;

/// Find a guild role by name
pub async fn find_role(
    http: &Arc<serenity::Http>,
    guild_id: GuildId,
    name: &str,
) -> Result<Option<Role>, serenity::Error> {
    let roles = guild_id.roles(http).await?;
    Ok(roles.into_values().find(|role| role.name == name))
}

/// Find a guild text channel by name
pub async fn find_text_channel(
    http: &Arc<serenity::Http>,
    guild_id: GuildId,
    name: &str,
) -> Result<Option<GuildChannel>, serenity::Error> {
    let channels = guild_id.channels(http).await?;
    Ok(channels
        .into_values()
        .find(|channel| channel.kind == ChannelType::Text && channel.name == name))
}

/// All members currently carrying a role.
///
/// Walks the full member list - fine for the community-sized guilds this
/// bot runs in.
pub async fn role_holders(
    http: &Arc<serenity::Http>,
    guild_id: GuildId,
    role_id: RoleId,
) -> Result<Vec<Member>, serenity::Error> {
    let members = guild_id.members(http, None, None).await?;
    Ok(members
        .into_iter()
        .filter(|member| member.roles.contains(&role_id))
        .collect())
}

/// Build the jump link for a message
pub fn message_link(guild_id: GuildId, channel_id: ChannelId, message_id: MessageId) -> String {
    format!(
        "https://discord.com/channels/{}/{}/{}",
        guild_id, channel_id, message_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_link() {
        assert_eq!(
            message_link(GuildId::new(1), ChannelId::new(2), MessageId::new(3)),
            "https://discord.com/channels/1/2/3"
        );
    }
}
