/// Remote tournament service contract and its HTTP client.
pub mod remote;
/// Persisted session identity storage.
pub mod session_store;
