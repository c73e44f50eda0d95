use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, matcher::Discipline, Result};

/// Typed configuration, loaded from the environment (with `.env` support).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    /// How the running count is derived from the message stream.
    pub discipline: Discipline,
    /// Thread hit replies to the session announcement instead of the
    /// matching message.
    pub reply_to_anchor: bool,
    /// Restrict stop/menu/status to whoever started the session.
    pub initiator_only: bool,
    /// Max characters of captured message content shown in replies.
    pub capture_preview_len: usize,

    pub event_log_path: PathBuf,
    pub event_log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let discipline = match env_str("GAME_DISCIPLINE").and_then(non_empty) {
            Some(raw) => Discipline::parse(&raw)?,
            None => Discipline::Counting,
        };

        let reply_to_anchor = env_bool("GAME_REPLY_TO_ANCHOR").unwrap_or(true);
        let initiator_only = env_bool("GAME_INITIATOR_ONLY").unwrap_or(true);
        let capture_preview_len = env_usize("GAME_CAPTURE_PREVIEW_LEN").unwrap_or(500);

        let event_log_path = PathBuf::from(
            env_str("GAME_EVENT_LOG_PATH").unwrap_or("/tmp/kiriban-events.log".to_string()),
        );
        let event_log_json = env_bool("GAME_EVENT_LOG_JSON").unwrap_or(true);

        Ok(Self {
            telegram_bot_token,
            discipline,
            reply_to_anchor,
            initiator_only,
            capture_preview_len,
            event_log_path,
            event_log_json,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
