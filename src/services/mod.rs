/// Gated participant commands.
pub mod actions;
/// Login, registration, check-in and logout.
pub mod auth_service;
/// Read-only lookups.
pub mod public_service;
/// Card redemption driver.
pub mod redemption_service;
/// Scanned codes and deep links.
pub mod scanner;
/// Persisted session identity.
pub mod session;
/// Fetch-and-publish helpers.
pub mod snapshots;
/// Per-session background synchronization.
pub mod sync_loop;
/// Session-keyed owner of the sync loop.
pub mod sync_supervisor;
