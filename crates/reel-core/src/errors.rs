/// Core error type for the reel pipeline.
///
/// Adapter crates map their transport errors into this type so the boundary can
/// classify failures consistently (configuration vs upstream vs everything else).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream protocol error: {0}")]
    UpstreamProtocol(String),

    /// A single media item could not be resolved. Recovered locally by the
    /// file resolver; never reaches the caller.
    #[error("could not resolve media {media_ref}: {reason}")]
    ItemResolution { media_ref: String, reason: String },

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("concurrent join failed: {0}")]
    Join(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// True for failures of the bulk history call (surfaced as a bad-gateway).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::UpstreamUnavailable(_) | Error::UpstreamProtocol(_)
        )
    }

    /// Human-readable detail without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            Error::Config(s)
            | Error::UpstreamUnavailable(s)
            | Error::UpstreamProtocol(s)
            | Error::MethodNotAllowed(s)
            | Error::BadRequest(s)
            | Error::Join(s)
            | Error::External(s) => s.clone(),
            Error::ItemResolution { .. } => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
