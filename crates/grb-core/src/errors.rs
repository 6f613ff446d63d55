use crate::domain::ChatId;

/// Error taxonomy for the relay.
///
/// Every variant except `Config` is handled at the boundary of the operation
/// that detected it and converted into a user-facing acknowledgement; only a
/// failed startup configuration aborts the process. The adapter crate maps
/// transport failures into `Transport`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("administrator privileges required")]
    PermissionDenied,

    #[error("group {0} is not registered")]
    GroupNotFound(ChatId),

    #[error("forwarding is paused for group {0}")]
    GroupInactive(ChatId),

    #[error("no pending reply session")]
    SessionExpired,

    #[error("invalid argument: {0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unsupported message type")]
    UnsupportedContent,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
