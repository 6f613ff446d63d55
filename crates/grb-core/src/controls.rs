use crate::{
    domain::{ChatId, MessageId, UserId},
    errors::Error,
    Result,
};

const VERSION: &str = "v1";

/// Typed form of an inline-control callback payload.
///
/// Encoded as `v1:<op>:<ids>` and decoded exactly once, at the callback
/// boundary; nothing downstream ever splits the raw string again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    /// Arm a reply into the source group.
    ReplyGroup { chat: ChatId },
    /// Arm a reply threaded under the source message.
    ReplyMessage { chat: ChatId, message: MessageId },
    /// Arm a direct reply to a private user.
    ReplyUser { user: UserId },
    /// Flip the group's forwarding flag. Self-contained: never touches the
    /// pending store.
    ToggleGroup { chat: ChatId },
}

impl ControlAction {
    pub fn encode(&self) -> String {
        match self {
            Self::ReplyGroup { chat } => format!("{VERSION}:rg:{chat}"),
            Self::ReplyMessage { chat, message } => {
                format!("{VERSION}:rm:{chat}:{}", message.0)
            }
            Self::ReplyUser { user } => format!("{VERSION}:ru:{user}"),
            Self::ToggleGroup { chat } => format!("{VERSION}:tg:{chat}"),
        }
    }

    pub fn decode(data: &str) -> Result<Self> {
        let parts: Vec<&str> = data.split(':').collect();

        match parts.as_slice() {
            [VERSION, "rg", chat] => Ok(Self::ReplyGroup {
                chat: ChatId(parse_i64(chat)?),
            }),
            [VERSION, "rm", chat, message] => Ok(Self::ReplyMessage {
                chat: ChatId(parse_i64(chat)?),
                message: MessageId(parse_i32(message)?),
            }),
            [VERSION, "ru", user] => Ok(Self::ReplyUser {
                user: UserId(parse_i64(user)?),
            }),
            [VERSION, "tg", chat] => Ok(Self::ToggleGroup {
                chat: ChatId(parse_i64(chat)?),
            }),
            [version, ..] if *version != VERSION => Err(Error::Validation(format!(
                "unsupported control version: {version}"
            ))),
            _ => Err(Error::Validation(format!("malformed control: {data}"))),
        }
    }

    /// Reply controls are single-shot against the message copy carrying
    /// them; the toggle control stays live.
    pub fn is_reply(&self) -> bool {
        !matches!(self, Self::ToggleGroup { .. })
    }
}

fn parse_i64(s: &str) -> Result<i64> {
    s.parse::<i64>()
        .map_err(|_| Error::Validation(format!("not a numeric id: {s}")))
}

fn parse_i32(s: &str) -> Result<i32> {
    s.parse::<i32>()
        .map_err(|_| Error::Validation(format!("not a numeric id: {s}")))
}
