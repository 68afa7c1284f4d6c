use super::GameState;
use crate::types::Outcome;

impl GameState {
    /// End-of-game announcement, `None` while the game is still running
    pub fn result_text(&self) -> Option<String> {
        let outcome = self.outcome();
        match outcome {
            Outcome::NoOutcome => None,
            Outcome::Draw { method } => Some(format!("Game completed. Draw by {}.", method)),
            Outcome::Decisive { winner } => {
                let score = outcome.score();
                if self.automated == Some(winner) {
                    return Some(format!(
                        "I won this time! Better luck next time. {} by checkmate.",
                        score
                    ));
                }

                let voters = self.voters_of_record.join(", ");
                let text = match self.voters_of_record.len() {
                    0 => format!("The bot was defeated. {} by checkmate.", score),
                    1 => format!(
                        "Well played, {}! You defeated the bot! {} by checkmate.",
                        voters, score
                    ),
                    _ => format!(
                        "Good job everyone! {} defeated the bot together! {} by checkmate.",
                        voters, score
                    ),
                };
                Some(text)
            }
        }
    }
}
