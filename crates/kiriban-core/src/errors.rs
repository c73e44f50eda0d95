/// Core error type for the game bot.
///
/// Adapter crates map platform errors into this type so the core can handle
/// failures consistently (user-facing validation vs. swallowed delivery
/// failures).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("no usable target numbers in {0:?}")]
    InvalidTargets(String),

    #[error("only the session initiator may do that")]
    Unauthorized,

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
