use chrono::{DateTime, TimeDelta, Utc};

/// Discord client-side timestamp rendering styles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// e.g. "16:20"
    ShortTime,
    /// e.g. "1 July 2025 16:20"
    DateTime,
    /// e.g. "in 3 hours"
    Relative,
}

impl TimestampStyle {
    fn suffix(&self) -> char {
        match self {
            TimestampStyle::ShortTime => 't',
            TimestampStyle::DateTime => 'f',
            TimestampStyle::Relative => 'R',
        }
    }
}

/// Format a `<t:...>` marker that Discord renders in the reader's timezone
pub fn discord_timestamp(at: DateTime<Utc>, style: TimestampStyle) -> String {
    format!("<t:{}:{}>", at.timestamp(), style.suffix())
}

/// Spell out a duration as "**1** day, **2** hours, **5** minutes".
///
/// Zero components are omitted; a zero duration renders as an empty string.
pub fn delta_to_text(delta: TimeDelta) -> String {
    let mut parts = Vec::new();

    let days = delta.num_days();
    let hours = delta.num_hours() % 24;
    let minutes = delta.num_minutes() % 60;
    let seconds = delta.num_seconds() % 60;

    for (amount, unit) in [
        (days, "day"),
        (hours, "hour"),
        (minutes, "minute"),
        (seconds, "second"),
    ] {
        if amount > 0 {
            let plural = if amount > 1 { "s" } else { "" };
            parts.push(format!("**{}** {}{}", amount, unit, plural));
        }
    }

    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_discord_timestamp_styles() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        assert_eq!(discord_timestamp(at, TimestampStyle::ShortTime), "<t:1700000000:t>");
        assert_eq!(discord_timestamp(at, TimestampStyle::DateTime), "<t:1700000000:f>");
        assert_eq!(discord_timestamp(at, TimestampStyle::Relative), "<t:1700000000:R>");
    }

    #[test]
    fn test_delta_to_text_full() {
        let delta = TimeDelta::days(2) + TimeDelta::hours(3) + TimeDelta::minutes(1);
        assert_eq!(delta_to_text(delta), "**2** days, **3** hours, **1** minute");
    }

    #[test]
    fn test_delta_to_text_skips_zero_components() {
        assert_eq!(delta_to_text(TimeDelta::hours(5)), "**5** hours");
        assert_eq!(
            delta_to_text(TimeDelta::days(1) + TimeDelta::seconds(30)),
            "**1** day, **30** seconds"
        );
    }

    #[test]
    fn test_delta_to_text_zero() {
        assert_eq!(delta_to_text(TimeDelta::zero()), "");
    }
}
