//! Scanned participant codes and deep links.
//!
//! Malformed input from either source is dropped without a message.

use tracing::debug;
use url::Url;

use crate::{
    dto::player::Player,
    error::ClientError,
    services::auth_service,
    state::SharedState,
};

const DEEP_LINK_SCHEME: &str = "gamesign";
const DEEP_LINK_HOST: &str = "open";

/// Extract the participant id from a scanned code: a URL carrying `uid`, or
/// a bare integer.
pub fn parse_participant_code(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(id) = raw.parse::<u32>() {
        return Some(id);
    }

    let url = Url::parse(raw).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "uid")
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
}

/// Resolve a scanned code to a participant, announce the name and start an
/// auth check for it.
///
/// Returns `Ok(None)` when the code was not a participant code.
pub async fn resolve_scanned_code(
    state: &SharedState,
    raw: &str,
) -> Result<Option<Player>, ClientError> {
    let Some(id) = parse_participant_code(raw) else {
        debug!("ignoring unrecognized scanned code");
        return Ok(None);
    };

    let player = match state.api().player(id).await {
        Ok(player) => player,
        Err(err) => {
            let err = ClientError::from(err);
            state.notify_error(&err);
            return Err(err);
        }
    };
    state.announce_scanned_name(player.name.clone());
    auth_service::check_status(state, &player.name).await?;
    Ok(Some(player))
}

/// Screens reachable from an external link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeepLink {
    /// Participant home.
    Home,
    /// Public leaderboard.
    Rankings,
}

impl DeepLink {
    /// Parse `gamesign://open` or `gamesign://open/rankings`.
    pub fn parse(raw: &str) -> Option<Self> {
        let url = Url::parse(raw.trim()).ok()?;
        if url.scheme() != DEEP_LINK_SCHEME || url.host_str() != Some(DEEP_LINK_HOST) {
            return None;
        }
        match url.path().trim_end_matches('/') {
            "" => Some(DeepLink::Home),
            "/rankings" => Some(DeepLink::Rankings),
            _ => None,
        }
    }
}
