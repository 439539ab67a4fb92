use serde::{Deserialize, Serialize};

/// Telegram message id (numeric, unique within a channel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque handle identifying an uploaded file (Bot API `file_id`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MediaRef(pub String);

impl std::fmt::Display for MediaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attachment payload shared by the `video` and `document` shapes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// One record of the channel history, as delivered by upstream.
///
/// Only the fields the selector looks at are decoded; everything else is
/// ignored. Decoding is lenient (see [`RawMessage::from_value`]).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub video: Option<Attachment>,
    #[serde(default)]
    pub document: Option<Attachment>,
}

impl RawMessage {
    /// Decode a single history record. Records that do not fit the expected
    /// shape decode to an empty message, which the selector drops.
    pub fn from_value(v: serde_json::Value) -> Self {
        serde_json::from_value(v).unwrap_or_default()
    }
}

/// Normalized view of a media-bearing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub message_id: MessageId,
    pub media_ref: MediaRef,
    pub display_caption: String,
}

/// One playable item returned to the client.
///
/// `download_url` is time-bounded (about an hour); clients must not cache it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMedia {
    pub id: MessageId,
    pub caption: String,
    pub download_url: String,
}

/// Outcome of resolving one descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedMedia),
    Unresolved { message_id: MessageId, reason: String },
}

impl Resolution {
    pub fn into_resolved(self) -> Option<ResolvedMedia> {
        match self {
            Resolution::Resolved(m) => Some(m),
            Resolution::Unresolved { .. } => None,
        }
    }
}
