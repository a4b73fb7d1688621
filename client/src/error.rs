use thiserror::Error;

/// A custom error type for the aggregation service client.
#[derive(Error, Debug)]
pub enum FreeGptError {
    /// An error occurred while making a request.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    /// An error occurred while serializing or deserializing data.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A non-success status returned by the API.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    /// None of the backends behind the service accepted the requested model.
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),
    /// The image endpoint answered without a URL or inline payload.
    #[error("image response contained neither a URL nor inline data")]
    EmptyImage,
    /// Inline image data was not valid base64.
    #[error("invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Coarse classification of a [`FreeGptError`], used by callers to decide
/// whether another attempt is worthwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
    UnsupportedModel,
    Unknown,
}

impl FreeGptError {
    /// Builds the error for a non-success HTTP status and its body.
    ///
    /// The aggregation service reports an unknown model either with a 404 or
    /// with a 4xx/5xx body that names the model problem.
    pub fn from_status(status: u16, body: &str) -> Self {
        let lowered = body.to_lowercase();
        let names_model = lowered.contains("model not found")
            || lowered.contains("not supported")
            || lowered.contains("unsupported model")
            || lowered.contains("unknown model");

        let message = if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            body.trim().to_string()
        };

        if status == 404 || names_model {
            FreeGptError::UnsupportedModel(message)
        } else {
            FreeGptError::Api { status, message }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FreeGptError::Request(e) if e.is_decode() => ErrorKind::Parse,
            FreeGptError::Request(_) => ErrorKind::Network,
            FreeGptError::Serde(_) | FreeGptError::EmptyImage | FreeGptError::Base64(_) => {
                ErrorKind::Parse
            }
            FreeGptError::UnsupportedModel(_) => ErrorKind::UnsupportedModel,
            FreeGptError::Api { status, .. } if *status == 429 || *status >= 500 => {
                ErrorKind::Network
            }
            FreeGptError::Api { .. } => ErrorKind::Unknown,
        }
    }

    /// True when repeating the call (possibly in another mode) may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Unknown)
    }
}
