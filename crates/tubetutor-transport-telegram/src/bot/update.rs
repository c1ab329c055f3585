//! Inbound webhook update parsing
//!
//! Only the fields the bot acts on are read: the update id, and for plain
//! messages the chat id and text. Everything else in the payload is ignored.

use serde::Deserialize;
use teloxide::utils::command::BotCommands;

use super::handlers::Command;

#[derive(Deserialize)]
struct RawUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Deserialize)]
struct RawMessage {
    chat: RawChat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct RawChat {
    id: i64,
}

/// A webhook delivery reduced to what the handlers need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Telegram `update_id`, unique per delivery
    pub event_id: i64,
    /// Text message carried by the update, if any
    pub message: Option<TextMessage>,
}

/// A text message from a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    /// Originating chat
    pub chat_id: i64,
    /// Message text
    pub text: String,
}

/// What a text message asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// A command the bot knows
    Command(Command),
    /// A slash command the bot does not handle
    UnknownCommand(String),
    /// Free text, treated as a video link
    Text(String),
}

impl TextMessage {
    /// Classify the message text.
    ///
    /// A command may carry a `@botname` suffix. When `bot_username` is known,
    /// a suffix naming any other bot makes the command an `UnknownCommand`.
    #[must_use]
    pub fn intent(&self, bot_username: Option<&str>) -> Intent {
        let text = self.text.trim();
        let Some(command) = text.strip_prefix('/') else {
            return Intent::Text(text.to_string());
        };

        let token = command.split_whitespace().next().unwrap_or_default();
        let (name, addressee) = token
            .split_once('@')
            .map_or((token, None), |(name, addressee)| (name, Some(addressee)));

        if let (Some(addressee), Some(own)) = (addressee, bot_username) {
            if !addressee.eq_ignore_ascii_case(own) {
                return Intent::UnknownCommand(token.to_string());
            }
        }

        Command::parse(&format!("/{name}"), "")
            .map_or_else(|_| Intent::UnknownCommand(name.to_string()), Intent::Command)
    }
}

/// Parse a webhook body.
///
/// # Errors
///
/// Returns the JSON error for invalid payloads or a missing `update_id`.
pub fn parse_update(body: &[u8]) -> Result<InboundEvent, serde_json::Error> {
    let raw: RawUpdate = serde_json::from_slice(body)?;

    Ok(InboundEvent {
        event_id: raw.update_id,
        message: raw.message.and_then(|message| {
            message.text.map(|text| TextMessage {
                chat_id: message.chat.id,
                text,
            })
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(text: &str) -> TextMessage {
        TextMessage {
            chat_id: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_parse_text_message() -> Result<(), serde_json::Error> {
        let body = br#"{"update_id":42,"message":{"message_id":5,"date":0,"chat":{"id":-100,"type":"private"},"text":"https://youtu.be/abc123"}}"#;
        let event = parse_update(body)?;

        assert_eq!(event.event_id, 42);
        assert_eq!(
            event.message,
            Some(TextMessage {
                chat_id: -100,
                text: "https://youtu.be/abc123".to_string()
            })
        );
        Ok(())
    }

    #[test]
    fn test_parse_non_text_updates() -> Result<(), serde_json::Error> {
        let sticker = br#"{"update_id":7,"message":{"chat":{"id":1},"sticker":{}}}"#;
        assert_eq!(parse_update(sticker)?.message, None);

        let edited = br#"{"update_id":8,"edited_message":{"chat":{"id":1},"text":"x"}}"#;
        assert_eq!(parse_update(edited)?.message, None);
        Ok(())
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_update(b"not json").is_err());
        assert!(parse_update(br#"{"message":{"chat":{"id":1},"text":"hi"}}"#).is_err());
        assert!(parse_update(br#"{"update_id":"nope"}"#).is_err());
    }

    #[test]
    fn test_intent() {
        let own = Some("tubetutor_bot");
        assert_eq!(text("/start").intent(own), Intent::Command(Command::Start));
        assert_eq!(
            text("/start@tubetutor_bot").intent(own),
            Intent::Command(Command::Start)
        );
        assert_eq!(
            text("/help me").intent(own),
            Intent::UnknownCommand("help".to_string())
        );
        assert_eq!(
            text("  https://youtu.be/abc123 ").intent(own),
            Intent::Text("https://youtu.be/abc123".to_string())
        );
    }

    #[test]
    fn test_command_for_another_bot_is_unknown() {
        assert_eq!(
            text("/start@SomeOtherBot").intent(Some("tubetutor_bot")),
            Intent::UnknownCommand("start@SomeOtherBot".to_string())
        );
        assert_eq!(
            text("/start@TubeTutor_Bot").intent(Some("tubetutor_bot")),
            Intent::Command(Command::Start)
        );
        // Own name unknown: the suffix cannot be checked
        assert_eq!(
            text("/start@SomeOtherBot").intent(None),
            Intent::Command(Command::Start)
        );
    }
}
