/// Expiration actions, one module per task kind
mod burger;
mod giveaway;
mod reminder;
mod repost;
mod roulette;

// Re-export handlers and their payload types
pub use burger::{BurgerPayload, BurgerRotHandler};
pub use giveaway::{GiveawayEndHandler, GiveawayPayload, giveaway_embed};
pub use reminder::{ReminderHandler, ReminderLocation, ReminderPayload};
pub use repost::{RepostPayload, RepostPenaltyHandler};
pub use roulette::RouletteTimeoutHandler;
