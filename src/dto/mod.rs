/// Registration and login payloads.
pub mod auth;
/// Uniform response envelope.
pub mod envelope;
/// Head-to-head match payloads.
pub mod match_info;
/// Participant snapshot payloads.
pub mod player;
/// Leaderboard payloads.
pub mod ranking;
/// Outbound request bodies.
pub mod requests;
/// Song draw payloads.
pub mod song_draw;
