/// Command and message handlers
pub mod handlers;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;
/// Chat transport abstraction and its Telegram implementation
pub mod transport;
/// Inbound webhook update parsing
pub mod update;

pub use transport::{ChatTransport, MessageHandle, TelegramTransport};
