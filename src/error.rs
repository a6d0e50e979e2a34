use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of failures, so callers can tell a bad request
/// apart from a flaky upstream or a payload that could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Config,
    UpstreamUnavailable,
    DecodeFailure,
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("OpenAI error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),

    #[error("Upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Self::Tokenizer(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Yaml(_) => ErrorKind::Config,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Llm(_)
            | Self::Network(_)
            | Self::OpenAi(_)
            | Self::UpstreamStatus { .. }
            | Self::Storage(_) => ErrorKind::UpstreamUnavailable,
            Self::Tokenizer(_) | Self::Image(_) | Self::Serialization(_) => {
                ErrorKind::DecodeFailure
            }
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::config("x").kind(), ErrorKind::Config);
        assert_eq!(Error::invalid_input("x").kind(), ErrorKind::InvalidInput);
        assert_eq!(Error::llm("x").kind(), ErrorKind::UpstreamUnavailable);
        assert_eq!(Error::tokenizer("x").kind(), ErrorKind::DecodeFailure);
        assert_eq!(
            Error::from(std::io::Error::other("disk full")).kind(),
            ErrorKind::Io
        );
        assert_eq!(
            Error::UpstreamStatus {
                status: 503,
                body: String::new()
            }
            .kind(),
            ErrorKind::UpstreamUnavailable
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::UpstreamStatus {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream returned 404: not found");
    }
}
