use async_trait::async_trait;

use crate::{
    domain::{MediaRef, RawMessage},
    Result,
};

/// Hexagonal port for the bulk history call.
///
/// Implementations return the most recent `limit` messages, oldest-to-newest,
/// and classify failures as `UpstreamUnavailable` or `UpstreamProtocol`.
#[async_trait]
pub trait ChannelHistory: Send + Sync {
    async fn recent_messages(&self, limit: u32) -> Result<Vec<RawMessage>>;
}

/// Hexagonal port for the per-item storage lookup.
#[async_trait]
pub trait FileLocator: Send + Sync {
    /// Look up the current storage path of one media item.
    async fn file_path(&self, media_ref: &MediaRef) -> Result<String>;

    /// Build a direct, time-bounded download locator from a storage path.
    fn download_url(&self, file_path: &str) -> String;
}
