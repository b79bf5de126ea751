//! Fetch-and-publish helpers shared by the sync loop and the command paths.

use tracing::debug;

use crate::{
    dto::song_draw::SongDrawState,
    error::ClientError,
    state::{EngineState, SessionTicket, promotion},
};

/// How a refresh failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Background poll: failures are logged and retried on the next tick.
    Quiet,
    /// Participant-triggered: failures are also broadcast as a notice.
    Loud,
}

/// Fetch the participant and publish the snapshot under `ticket`.
pub async fn refresh_player(state: &EngineState, ticket: &SessionTicket, mode: RefreshMode) -> bool {
    let result = state
        .api()
        .player(ticket.player_id)
        .await
        .map_err(ClientError::from);
    report(state, &result, mode);
    state.publish_player(ticket, result).await
}

/// Fetch the active match, or publish "no match" when none can exist.
pub async fn refresh_match(state: &EngineState, ticket: &SessionTicket, mode: RefreshMode) -> bool {
    let plausible = state
        .player()
        .latest()
        .is_some_and(|player| promotion::may_have_active_match(&player));
    if !plausible {
        return state.publish_match(ticket, Ok(None)).await;
    }

    let result = state
        .api()
        .player_match(ticket.player_id)
        .await
        .map_err(ClientError::from);
    report(state, &result, mode);
    state.publish_match(ticket, result).await
}

/// Fetch the song draw; returns the new snapshot when it was accepted.
pub async fn refresh_song_draw(
    state: &EngineState,
    ticket: &SessionTicket,
) -> Option<SongDrawState> {
    let result = state
        .api()
        .song_draw_state()
        .await
        .map_err(ClientError::from);
    let draw = result.as_ref().ok().cloned();
    let accepted = state.publish_song_draw(ticket, result).await;
    draw.filter(|_| accepted)
}

fn report<T>(state: &EngineState, result: &Result<T, ClientError>, mode: RefreshMode) {
    if let Err(err) = result {
        match mode {
            RefreshMode::Quiet => debug!(error = %err, "background refresh failed"),
            RefreshMode::Loud => state.notify_error(err),
        }
    }
}
