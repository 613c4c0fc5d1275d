use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unknown provider '{0}' (expected gemini or openai)")]
    UnknownProvider(String),

    #[error("missing API key for {provider}; {hint}")]
    MissingApiKey {
        provider: &'static str,
        hint: &'static str,
    },

    #[error("building HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{provider} response is not valid JSON: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} blocked the page: {reason}")]
    Blocked {
        provider: &'static str,
        reason: String,
    },
}
