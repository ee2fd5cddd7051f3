use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KataError>;

#[derive(Error, Debug)]
pub enum KataError {
    #[error("API key is missing, set '{var}' in the .env")]
    MissingCredential { var: &'static str },

    #[error("HTTP error: {code} - {reason}")]
    HttpStatus { code: u16, reason: String },

    #[error("Rate limit reached on {service}, {}", reset_hint(.reset_at.as_ref()))]
    RateLimited {
        service: &'static str,
        reset_at: Option<DateTime<Utc>>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Couldn't decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Couldn't read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KataError {
    pub fn from_status(status: StatusCode) -> Self {
        KataError::HttpStatus {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_owned(),
        }
    }

    /// Builds a decode error for a body that is valid json but misses what we need.
    pub fn malformed(msg: impl std::fmt::Display) -> Self {
        KataError::Decode(<serde_json::Error as serde::de::Error>::custom(msg))
    }

    /// Fatal errors end the process, the others only end the current query.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KataError::MissingCredential { .. }
                | KataError::Network(_)
                | KataError::Csv(_)
                | KataError::Config { .. }
                | KataError::Io(_)
        )
    }
}

fn reset_hint(reset_at: Option<&DateTime<Utc>>) -> String {
    match reset_at {
        Some(reset) => format!("you'll have to wait until {}", reset.format("%H:%M:%S UTC")),
        None => String::from("you'll have to wait before trying again"),
    }
}
