use thiserror::Error;

/// Historical bootstrap failed for one symbol.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("history endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid history response: {0}")]
    InvalidResponse(String),

    #[error("history endpoint returned no samples")]
    Empty,
}

/// A live message could not be turned into a tick.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("invalid event timestamp: {0}")]
    InvalidTimestamp(i64),
}

/// Feed transport is down.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("feed channel closed")]
    ChannelClosed,
}

/// The notification sink refused or could not be reached.
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification rejected with status {status}")]
    Rejected { status: u16 },
}
