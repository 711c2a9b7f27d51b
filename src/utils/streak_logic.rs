//! Pure functions for roulette streak bookkeeping (Discord-agnostic)

/// Current and past-best streak lengths for one sequence of outcomes.
///
/// The current streak is the run of wins since the last loss (or since the
/// start); the best is the longest *completed* run before it.
pub fn parse_streaks(results: &[bool]) -> (usize, usize) {
    let mut boundaries: Vec<i64> = vec![-1];
    boundaries.extend(
        results
            .iter()
            .enumerate()
            .filter(|(_, win)| !**win)
            .map(|(i, _)| i as i64),
    );
    boundaries.push(results.len() as i64);

    let streaks: Vec<i64> = boundaries
        .windows(2)
        .map(|pair| pair[1] - pair[0] - 1)
        .collect();

    let current = streaks.last().copied().unwrap_or(0) as usize;
    let best = streaks[..streaks.len() - 1]
        .iter()
        .copied()
        .max()
        .unwrap_or(0) as usize;

    (current, best)
}

/// Streak standings for one user against the rest of the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakSummary {
    /// The user's active streak
    pub current: usize,
    /// The user's best completed streak
    pub personal_best: usize,
    /// The highest active streak among everyone else
    pub server_current_best: usize,
    /// The highest streak anyone else has ever had
    pub server_alltime_best: usize,
}

/// Compute the streak standings from the full round log
pub fn summarize_streaks(rounds: &[(i64, bool)], user_id: i64) -> StreakSummary {
    let mut summary = StreakSummary::default();

    let mut user_ids: Vec<i64> = rounds.iter().map(|(id, _)| *id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    for id in user_ids {
        let results: Vec<bool> = rounds
            .iter()
            .filter(|(round_user, _)| *round_user == id)
            .map(|(_, win)| *win)
            .collect();
        let (current, best) = parse_streaks(&results);

        if id == user_id {
            summary.current = current;
            summary.personal_best = best;
        } else {
            summary.server_current_best = summary.server_current_best.max(current);
            summary.server_alltime_best = summary.server_alltime_best.max(current.max(best));
        }
    }

    summary
}

/// Pick the flavor line for a survived round
pub fn win_message(user_mention: &str, summary: &StreakSummary) -> String {
    let plural = if summary.current > 1 { "s" } else { "" };
    let mut message = format!(
        "Luck is on your side, {}! You have now survived for {} round{} in a row",
        user_mention, summary.current, plural
    );

    if summary.current > summary.server_alltime_best {
        message.push_str(", a new all-time record for the server!");
    } else if summary.current > summary.server_current_best
        && summary.current > summary.personal_best
    {
        message.push_str(", the highest currently active streak and a new personal best!");
    } else if summary.current > summary.server_current_best {
        message.push_str(", the highest currently active streak!");
    } else if summary.current > summary.personal_best {
        message.push_str(", a new personal best!");
    } else {
        message.push('.');
    }

    message
}
