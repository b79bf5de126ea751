//! Error types shared by the tournament service client.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`RemoteError`] failures.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failures that can occur while talking to the tournament service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build tournament service client")]
    ClientBuilder {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The configured base URL cannot be used.
    #[error("invalid tournament service url `{url}`")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The request could not be sent or timed out.
    #[error("failed to send request to `{path}`")]
    RequestSend {
        /// Route relative to the base URL.
        path: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The response body could not be read.
    #[error("failed to read response from `{path}`")]
    ReadBody {
        /// Route relative to the base URL.
        path: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a status and no envelope.
    #[error("unexpected response status {status} for `{path}`")]
    RequestStatus {
        /// Route relative to the base URL.
        path: String,
        /// HTTP status of the response.
        status: StatusCode,
    },
    /// The envelope or its payload did not match the expected shape.
    #[error("failed to decode response for `{path}`")]
    DecodeResponse {
        /// Route relative to the base URL.
        path: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// A successful envelope carried no payload where one is required.
    #[error("response for `{path}` carried no data")]
    MissingData {
        /// Route relative to the base URL.
        path: String,
    },
    /// The service refused the request (`success = false`).
    #[error("request rejected by the service ({code}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        /// Code from the envelope.
        code: i32,
        /// Message from the envelope.
        message: Option<String>,
    },
}

impl RemoteError {
    /// Network-level failure, worth retrying on the next poll.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RemoteError::RequestSend { .. }
                | RemoteError::ReadBody { .. }
                | RemoteError::RequestStatus { .. }
        )
    }
}
