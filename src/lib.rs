//! Library crate for gamesign-client, exposing modules for the binary and integration tests.

/// Client configuration.
pub mod config;
/// Remote service and persisted storage access.
pub mod dao;
/// Wire payloads.
pub mod dto;
/// Service-layer errors.
pub mod error;
/// Async flows driving the engine.
pub mod services;
/// Shared engine state and pure state machines.
pub mod state;
