//! Media selection: RawMessage -> MediaDescriptor.
//!
//! Pure and infallible. Messages without a usable attachment are dropped, never
//! reported.

use std::collections::HashSet;

use crate::domain::{Attachment, MediaDescriptor, MediaRef, MessageId, RawMessage, ResolvedMedia};

/// Select media-bearing messages, preserving their relative order.
///
/// A message qualifies when it carries a `video` or `document` attachment with
/// a file handle. The first occurrence of a message id wins.
pub fn select_media(messages: &[RawMessage]) -> Vec<MediaDescriptor> {
    let mut seen = HashSet::new();
    messages
        .iter()
        .filter_map(describe)
        .filter(|d| seen.insert(d.message_id))
        .collect()
}

/// Normalize one message, or `None` if it carries no usable media.
pub fn describe(msg: &RawMessage) -> Option<MediaDescriptor> {
    let message_id = MessageId(msg.message_id?);
    // Video wins; documents cover videos uploaded as generic files.
    let attachment = msg.video.as_ref().or(msg.document.as_ref())?;
    let file_id = attachment.file_id.as_deref().filter(|s| !s.is_empty())?;

    Some(MediaDescriptor {
        message_id,
        media_ref: MediaRef(file_id.to_string()),
        display_caption: display_caption(msg.caption.as_deref(), attachment, message_id),
    })
}

/// Caption precedence: message caption, attachment file name, `Media {id}`.
fn display_caption(caption: Option<&str>, attachment: &Attachment, id: MessageId) -> String {
    caption
        .filter(|s| !s.is_empty())
        .or_else(|| attachment.file_name.as_deref().filter(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Media {id}"))
}

/// Keep items whose caption contains `query`, case-insensitively.
///
/// A blank query keeps everything. Order is preserved.
pub fn filter_by_caption(items: Vec<ResolvedMedia>, query: &str) -> Vec<ResolvedMedia> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|m| m.caption.to_lowercase().contains(&needle))
        .collect()
}
