use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("dictionary `{0}` not found")]
    DictionaryNotFound(String),

    #[error("dictionary `{name}` is malformed: {source}")]
    DictionaryFormat {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("dictionary `{0}` has no words")]
    EmptyDictionary(String),

    #[error("settings cannot change while a session is running")]
    SessionRunning,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}
