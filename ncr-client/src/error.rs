use std::fmt;

use reqwest::StatusCode;

#[derive(Debug)]
pub enum Error {
    ConfigError(reqwest::Error),
    UrlParsingError(String),
    JSONParsingError(String),
    TimestampParsingError(String),

    ConnectionError(String),
    StatusError { status: StatusCode, message: String },
    ManifestUnknown,
    DeleteRejected { status: StatusCode, body: String },
    ResponseDigestInvalid,

    ReferenceInvalidError,
    DigestInvalidError,
    TagInvalidError,
}

impl Error {
    pub fn into_config(reqwest_error: reqwest::Error) -> Self {
        Self::ConfigError(reqwest_error)
    }

    /// The registry could not be reached or the connection dropped.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }

    /// A response or a timestamp inside it could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::JSONParsingError(_) | Self::TimestampParsingError(_))
    }

    pub fn is_manifest_unknown(&self) -> bool {
        matches!(self, Self::ManifestUnknown)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigError(e) => write!(f, "failed to configure http client: {}", e),
            Error::UrlParsingError(s) => write!(f, "invalid url: {}", s),
            Error::JSONParsingError(s) => write!(f, "failed to decode response: {}", s),
            Error::TimestampParsingError(s) => write!(f, "failed to parse timestamp: {}", s),
            Error::ConnectionError(s) => write!(f, "connection failed: {}", s),
            Error::StatusError { status, message } => {
                write!(f, "registry responded with {}: {}", status, message)
            }
            Error::ManifestUnknown => write!(f, "manifest unknown to registry"),
            Error::DeleteRejected { status, body } => {
                write!(f, "unexpected response from server: {}, body: {}", status, body)
            }
            Error::ResponseDigestInvalid => {
                write!(f, "response body does not match its Docker-Content-Digest")
            }
            Error::ReferenceInvalidError => write!(f, "reference is neither a tag nor a digest"),
            Error::DigestInvalidError => write!(f, "invalid digest"),
            Error::TagInvalidError => write!(f, "invalid tag"),
        }
    }
}

impl std::error::Error for Error {}

impl From<url::ParseError> for Error {
    fn from(value: url::ParseError) -> Self {
        Error::UrlParsingError(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONParsingError(value.to_string())
    }
}
