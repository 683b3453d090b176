//! Telegram Bot API transport
//!
//! Long polling for inbound messages, plain-text replies and photo downloads.

mod client;
mod error;
mod poller;
pub mod types;


pub use client::TelegramClient;
pub use poller::run_polling;
