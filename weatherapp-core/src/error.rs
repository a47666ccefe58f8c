use thiserror::Error;

/// Shown when a failure carries no usable message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Failure of a single weather fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The API answered with a non-2xx status.
    #[error("HTTP {status} {message}")]
    Http {
        status: u16,
        /// Reason phrase, e.g. "Not Found".
        message: String,
        body: Option<String>,
    },

    /// Connection or body-read failure; never carries the request URL.
    #[error("{0}")]
    Transport(reqwest::Error),

    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    #[error("{}", .0.as_deref().unwrap_or(UNKNOWN_ERROR_MESSAGE))]
    Other(Option<String>),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs include the `appid` query parameter.
        FetchError::Transport(err.without_url())
    }
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Underlying message, if the failure has a non-empty one.
    pub fn message(&self) -> Option<String> {
        let msg = match self {
            FetchError::Http { message, .. } => message.clone(),
            FetchError::Transport(e) => e.to_string(),
            FetchError::Decode(e) => e.to_string(),
            FetchError::Other(msg) => msg.clone()?,
        };
        (!msg.trim().is_empty()).then_some(msg)
    }

    /// Text for the description widget.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Http {
                status, message, ..
            } => format!("Error {status}: {message}"),
            other => other
                .message()
                .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
        }
    }
}
