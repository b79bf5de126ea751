use serde::Deserialize;

/// Uniform response wrapper returned by every tournament service route.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Business outcome of the call.
    pub success: bool,
    /// Mirror of the HTTP status chosen by the service.
    #[serde(default)]
    pub code: i32,
    /// Payload, absent or `null` for acknowledgements and empty results.
    #[serde(default = "none")]
    pub data: Option<T>,
    /// Human readable message, shown verbatim to the participant.
    #[serde(default)]
    pub message: Option<String>,
}

fn none<T>() -> Option<T> {
    None
}

/// Successful acknowledgement of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack<T = ()> {
    /// Data returned alongside the acknowledgement.
    pub data: T,
    /// Optional confirmation text from the service.
    pub message: Option<String>,
}

impl Ack {
    /// Acknowledgement without payload.
    pub fn empty(message: Option<String>) -> Self {
        Self { data: (), message }
    }
}
