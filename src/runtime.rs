//! Runtime for executing visit conversations
//!
//! A single consumer loop owns every session, applies the pure state machine
//! to each inbound message and executes the resulting effects.

mod executor;
mod sessions;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::BotRuntime;
pub use traits::*;

use crate::commands::Command;
use crate::state_machine::PhotoVariant;

/// Production runtime wired to the visitor database and Telegram
pub type ProductionRuntime = BotRuntime<DatabaseStore, TelegramTransport>;

/// A chat message, independent of the transport it arrived on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: i64,
    /// Sender; sessions are keyed on this
    pub user_id: i64,
    pub content: InboundContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundContent {
    Command(Command),
    Text(String),
    Photo(Vec<PhotoVariant>),
    /// Stickers, documents, voice notes and anything else
    Unsupported,
}
