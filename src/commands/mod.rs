// Command modules
mod burger;
mod giveaway;
mod remindme;
mod roulette;

// Re-export all commands
pub use burger::{burger, burger_history, yoink};
pub use giveaway::giveaway;
pub use remindme::remindme;
pub use roulette::roulette;
