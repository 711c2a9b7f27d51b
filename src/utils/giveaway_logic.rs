//! Pure functions for giveaway entry and winner selection (Discord-agnostic)

use rand::Rng;
use rand::seq::SliceRandom;

/// Filter the bot's own entry out of the reactor list
pub fn eligible_entrants<T: PartialEq>(entrants: Vec<T>, bot: &T) -> Vec<T> {
    entrants.into_iter().filter(|entrant| entrant != bot).collect()
}

/// Draw up to `count` distinct winners from the entrants.
///
/// With fewer entrants than prizes, everyone wins.
pub fn draw_winners<T: Clone, R: Rng>(entrants: &[T], count: usize, rng: &mut R) -> Vec<T> {
    entrants.choose_multiple(rng, count).cloned().collect()
}

/// Build the announcement posted under a finished giveaway
pub fn finish_announcement(jump_url: &str, winner_mentions: &[String], title: &str, host_mention: &str) -> String {
    let mut message = format!("{}\n", jump_url);

    if winner_mentions.is_empty() {
        message.push_str("No winner could be determined.");
        return message;
    }

    message.push_str("Congratulations");
    for mention in winner_mentions {
        message.push(' ');
        message.push_str(mention);
    }
    message.push_str(&format!(
        "!\nYou have won the {}!\nContact {} for your prize.",
        title.to_lowercase(),
        host_mention
    ));

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_eligible_entrants_excludes_bot() {
        let entrants = vec![1u64, 2, 3, 99];
        assert_eq!(eligible_entrants(entrants, &99), vec![1, 2, 3]);
    }

    #[test]
    fn test_draw_winners_enough_entrants() {
        let entrants = vec![1u64, 2, 3, 4, 5];
        let mut rng = StdRng::seed_from_u64(7);

        let winners = draw_winners(&entrants, 2, &mut rng);

        assert_eq!(winners.len(), 2);
        assert!(winners.iter().all(|winner| entrants.contains(winner)));
        assert_ne!(winners[0], winners[1]);
    }

    #[test]
    fn test_draw_winners_fewer_entrants_than_prizes() {
        let entrants = vec![1u64, 2];
        let mut rng = StdRng::seed_from_u64(7);

        let mut winners = draw_winners(&entrants, 5, &mut rng);
        winners.sort();

        assert_eq!(winners, vec![1, 2]);
    }

    #[test]
    fn test_draw_winners_no_entrants() {
        let entrants: Vec<u64> = Vec::new();
        let mut rng = StdRng::seed_from_u64(7);

        assert!(draw_winners(&entrants, 3, &mut rng).is_empty());
    }

    #[test]
    fn test_finish_announcement_with_winners() {
        let message = finish_announcement(
            "https://discord.com/channels/1/2/3",
            &["<@10>".to_string(), "<@20>".to_string()],
            "STEAM KEY",
            "<@1>",
        );

        assert!(message.starts_with("https://discord.com/channels/1/2/3\n"));
        assert!(message.contains("Congratulations <@10> <@20>!"));
        assert!(message.contains("You have won the steam key!"));
        assert!(message.contains("Contact <@1> for your prize."));
    }

    #[test]
    fn test_finish_announcement_without_winners() {
        let message = finish_announcement("url", &[], "PRIZE", "<@1>");
        assert!(message.contains("No winner could be determined."));
    }
}
