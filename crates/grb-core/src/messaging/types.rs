use crate::{controls::ControlAction, domain::UserId};

/// Media kinds the relay recognizes and can re-emit by file reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Document,
    Video,
    Voice,
    Audio,
}

impl MediaKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Document => "document",
            Self::Video => "video",
            Self::Voice => "voice",
            Self::Audio => "audio",
        }
    }
}

/// Inbound message content, classified once at the transport boundary and
/// matched exhaustively everywhere downstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundContent {
    Text(String),
    Media {
        kind: MediaKind,
        file_id: String,
        caption: Option<String>,
    },
    /// Anything outside the recognized set (stickers, polls, locations, ...).
    Unsupported,
}

impl InboundContent {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Media { kind, .. } => kind.label(),
            Self::Unsupported => "unsupported",
        }
    }
}

/// Identity of a message sender as shown to administrators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub display_name: String,
}

/// Inline keyboard attached to an outbound message; one button per row.
#[derive(Clone, Debug)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }
}

impl InlineButton {
    pub fn new(label: impl Into<String>, action: &ControlAction) -> Self {
        Self {
            label: label.into(),
            callback_data: action.encode(),
        }
    }
}
