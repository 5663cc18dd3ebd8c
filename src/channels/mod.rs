//! Chat platform adapters.

pub mod telegram;

pub use telegram::{IncomingMessage, MessageStream, TelegramChannel};
