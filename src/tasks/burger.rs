use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, CreateMessage, GuildId, RoleId, UserId};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::constants::GENERAL_CHANNEL_NAME;
use crate::database::{Database, TransferReason};
use crate::errors::TaskError;
use crate::scheduler::{Task, TaskHandler};
use crate::utils::lookup::find_text_channel;

/// Stored with each burger rot task; the task subject is the holder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurgerPayload {
    pub guild_id: u64,
    pub role_id: u64,
}

/// Frees a burger that has been held for a full week: strips the role,
/// logs a mold transfer and posts the claim question in the general channel
pub struct BurgerRotHandler {
    http: Arc<serenity::Http>,
    db: Database,
}

impl BurgerRotHandler {
    pub fn new(http: Arc<serenity::Http>, db: Database) -> Self {
        Self { http, db }
    }
}

#[async_trait]
impl TaskHandler for BurgerRotHandler {
    async fn handle(&self, task: &Task) -> Result<(), TaskError> {
        let payload: BurgerPayload = task.decode_payload()?;
        let guild_id = GuildId::new(payload.guild_id);

        // A retried task must not log a second mold transfer or repeat the
        // announcement
        if let Some(last_mold) = self
            .db
            .last_transfer_from(task.subject_id, TransferReason::Mold)
            .await?
        {
            if last_mold >= task.expires_at {
                info!("Burger rot for user {} already handled", task.subject_id);
                return Ok(());
            }
        }

        let general = find_text_channel(&self.http, guild_id, GENERAL_CHANNEL_NAME)
            .await
            .map_err(|e| TaskError::from_discord(e, format!("guild {}", payload.guild_id)))?
            .ok_or_else(|| TaskError::MissingEntity(format!("channel #{}", GENERAL_CHANNEL_NAME)))?;

        // A vanished holder just means the burger is lost rather than moldy
        let holder = match guild_id
            .member(&self.http, UserId::new(task.subject_id as u64))
            .await
        {
            Ok(member) => {
                member
                    .remove_role(&self.http, RoleId::new(payload.role_id))
                    .await
                    .map_err(|e| TaskError::from_discord(e, format!("role {}", payload.role_id)))?;
                Some(member)
            }
            Err(e) => match TaskError::from_discord(e, format!("member {}", task.subject_id)) {
                TaskError::MissingEntity(_) => None,
                transient => return Err(transient),
            },
        };

        self.db
            .record_burger_transfer(Some(task.subject_id), None, TransferReason::Mold)
            .await?;

        let question = fetch_trivia_question().await;
        let announcement = match &holder {
            Some(member) => {
                let mold_count = self.db.mold_count(task.subject_id).await?;
                rot_announcement(Some(&member.user.id.to_string()), mold_count, &question)
            }
            None => rot_announcement(None, 0, &question),
        };

        general
            .id
            .send_message(&self.http, CreateMessage::new().content(announcement))
            .await
            .map_err(|e| TaskError::from_discord(e, format!("channel {}", general.id)))?;

        info!("Burger expired for user {}", task.subject_id);
        Ok(())
    }
}

/// A claim question with one right answer
#[derive(Debug, Clone)]
pub struct TriviaQuestion {
    pub question: String,
    pub correct: String,
    pub wrong: Vec<String>,
}

impl TriviaQuestion {
    /// All answer options in shuffled order
    pub fn shuffled_answers<R: Rng>(&self, rng: &mut R) -> Vec<String> {
        let mut answers: Vec<String> = Vec::with_capacity(self.wrong.len() + 1);
        answers.push(self.correct.clone());
        answers.extend(self.wrong.iter().cloned());
        answers.shuffle(rng);
        answers
    }
}

#[derive(Deserialize)]
struct ApiQuestion {
    question: ApiQuestionText,
    #[serde(rename = "correctAnswer")]
    correct_answer: String,
    #[serde(rename = "incorrectAnswers")]
    incorrect_answers: Vec<String>,
}

#[derive(Deserialize)]
struct ApiQuestionText {
    text: String,
}

/// Fetch a trivia question, falling back to a pre-set one when the API
/// misbehaves
async fn fetch_trivia_question() -> TriviaQuestion {
    match request_trivia().await {
        Ok(Some(question)) => question,
        Ok(None) => {
            warn!("Trivia API returned no questions, using a default question");
            fallback_question(&mut rand::thread_rng())
        }
        Err(e) => {
            warn!("Invalid response from trivia API, using a default question: {}", e);
            fallback_question(&mut rand::thread_rng())
        }
    }
}

async fn request_trivia() -> Result<Option<TriviaQuestion>, reqwest::Error> {
    let questions: Vec<ApiQuestion> = reqwest::get("https://the-trivia-api.com/v2/questions?limit=1")
        .await?
        .json()
        .await?;

    Ok(questions.into_iter().next().map(|question| TriviaQuestion {
        question: question.question.text,
        correct: question.correct_answer,
        wrong: question.incorrect_answers,
    }))
}

fn fallback_question<R: Rng>(rng: &mut R) -> TriviaQuestion {
    let questions = [
        (
            "How much does the average American ambulance trip cost?",
            "$1200",
            &["$200", "$800"][..],
        ),
        (
            "How many Americans think the sun revolves around the earth?",
            "1 in 4",
            &["1 in 2", "1 in 3", "1 in 5"][..],
        ),
        (
            "How many avocados do Americans eat a year combined?",
            "4.2 bn",
            &["2 bn", "6.5 bn"][..],
        ),
        (
            "How many Americans get injuries related to a TV falling every year?",
            "11 800",
            &["5 200", "13 900"][..],
        ),
    ];

    let (question, correct, wrong) = questions[rng.gen_range(0..questions.len())];
    TriviaQuestion {
        question: question.to_string(),
        correct: correct.to_string(),
        wrong: wrong.iter().map(|answer| answer.to_string()).collect(),
    }
}

/// Build the freedom announcement, with the answer options listed under the
/// question
fn rot_announcement(holder_id: Option<&str>, mold_count: i64, question: &TriviaQuestion) -> String {
    let options = question
        .shuffled_answers(&mut rand::thread_rng())
        .iter()
        .map(|answer| format!("- {}", answer))
        .collect::<Vec<_>>()
        .join("\n");

    match holder_id {
        Some(holder_id) => format!(
            "After its {}{} bout of fending off the mold in <@{}>'s fridge for a full \
             week, the burger yearns for freedom!\n\
             To claim it, answer the following question:\n\n{}\n{}",
            mold_count,
            ordinal_suffix(mold_count),
            holder_id,
            question.question,
            options
        ),
        None => format!(
            "Somehow, the burger was lost and is now looking for a new owner.\n\
             To claim it, answer the following question:\n\n{}\n{}",
            question.question, options
        ),
    }
}

/// "st"/"nd"/"rd"/"th" for a count
fn ordinal_suffix(n: i64) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_ordinal_suffix() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(2), "nd");
        assert_eq!(ordinal_suffix(3), "rd");
        assert_eq!(ordinal_suffix(4), "th");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(13), "th");
        assert_eq!(ordinal_suffix(21), "st");
        assert_eq!(ordinal_suffix(112), "th");
    }

    #[test]
    fn test_shuffled_answers_keeps_all_options() {
        let question = TriviaQuestion {
            question: "?".to_string(),
            correct: "right".to_string(),
            wrong: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };

        let mut answers = question.shuffled_answers(&mut StdRng::seed_from_u64(3));
        answers.sort();

        assert_eq!(answers, vec!["a", "b", "c", "right"]);
    }

    #[test]
    fn test_rot_announcement_mentions_holder() {
        let question = TriviaQuestion {
            question: "What?".to_string(),
            correct: "this".to_string(),
            wrong: vec!["that".to_string()],
        };

        let text = rot_announcement(Some("42"), 2, &question);
        assert!(text.contains("2nd bout"));
        assert!(text.contains("<@42>"));
        assert!(text.contains("What?"));
        assert!(text.contains("- this"));

        let lost = rot_announcement(None, 0, &question);
        assert!(lost.starts_with("Somehow, the burger was lost"));
    }
}
