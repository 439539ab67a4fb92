use std::{
    env, fs,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
};

use crate::{errors::Error, Result};

/// Fixed history window: the most recent N channel messages per request.
pub const HISTORY_LIMIT: u32 = 100;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_PORT: u16 = 3000;

/// Typed configuration for the service.
///
/// The bot credential and channel identity are optional here: a deployment
/// without them still starts, and every request fails with a configuration
/// error until they are supplied.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: Option<String>,
    pub telegram_channel_id: Option<String>,
    pub telegram_api_url: String,

    // Server
    pub bind_addr: SocketAddr,
}

/// Credentials passed explicitly into the pipeline.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub bot_token: String,
    pub channel_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("bot_token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (environment, map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN").and_then(non_empty);
        let telegram_channel_id = lookup("TELEGRAM_CHANNEL_ID").and_then(non_empty);

        let telegram_api_url = lookup("TELEGRAM_API_URL")
            .and_then(non_empty)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string());

        let host = match lookup("REEL_HOST").and_then(non_empty) {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|e| Error::Config(format!("REEL_HOST is not an IP address: {e}")))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match lookup("REEL_PORT").and_then(non_empty) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("REEL_PORT is not a port number: {e}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            telegram_bot_token,
            telegram_channel_id,
            telegram_api_url,
            bind_addr: SocketAddr::new(host, port),
        })
    }

    /// Both secrets, or a configuration error naming what is missing.
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.telegram_bot_token, &self.telegram_channel_id) {
            (Some(bot_token), Some(channel_id)) => Ok(Credentials {
                bot_token: bot_token.clone(),
                channel_id: channel_id.clone(),
            }),
            (None, None) => Err(Error::Config(
                "TELEGRAM_BOT_TOKEN and TELEGRAM_CHANNEL_ID are not configured".to_string(),
            )),
            (None, _) => Err(Error::Config(
                "TELEGRAM_BOT_TOKEN is not configured".to_string(),
            )),
            (_, None) => Err(Error::Config(
                "TELEGRAM_CHANNEL_ID is not configured".to_string(),
            )),
        }
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
