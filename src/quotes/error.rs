use thiserror::Error;

/// Why a quote refresh did not happen. Logged by callers, never sent to clients.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("no API key stored for user")]
    MissingApiKey,
    #[error("quote request timed out")]
    Timeout,
    #[error("quote request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("quote API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("quote response exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("quote API error (code {code:?}): {message}")]
    Provider { code: Option<i64>, message: String },
    #[error("malformed quote response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<reqwest::Error> for QuoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            QuoteError::Timeout
        } else {
            // The request URL carries the API key.
            QuoteError::Http(e.without_url())
        }
    }
}
