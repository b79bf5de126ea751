//! Participant commands, re-validated by the action gate before dispatch.

use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::remote::RemoteError,
    dto::{
        auth::MachineStatus,
        requests::{SubmitPeakSongRequest, SubmitScoreRequest},
    },
    error::ClientError,
    services::snapshots::{self, RefreshMode},
    state::{
        NoticeKind, SessionTicket, SharedState,
        gate::{self, Action},
        promotion::{self, ScorePhase},
    },
};

/// Take a competition station, or leave it.
pub async fn toggle_machine(state: &SharedState) -> Result<MachineStatus, ClientError> {
    let ticket = authorize(state, Action::ToggleMachine).await?;
    let ack = dispatch(state, state.api().toggle_machine(ticket.player_id).await)?;

    let fallback = if ack.data.on_machine {
        "you are now on a station"
    } else {
        "you left the station"
    };
    state.notify(
        NoticeKind::Success,
        ack.message.unwrap_or_else(|| fallback.into()),
    );
    snapshots::refresh_player(state, &ticket, RefreshMode::Loud).await;
    Ok(ack.data)
}

/// Submit a score for the phase the participant is currently in.
pub async fn submit_score(state: &SharedState, score: f64) -> Result<ScorePhase, ClientError> {
    let ticket = authorize(state, Action::SubmitScore).await?;
    let player = state.player().latest().ok_or(ClientError::NoSession)?;
    let request = SubmitScoreRequest {
        score,
        phase: promotion::score_phase(&player),
    };
    if let Err(err) = request.validate() {
        let err = ClientError::from(err);
        state.notify_error(&err);
        return Err(err);
    }

    let phase = request.phase;
    let ack = dispatch(
        state,
        state.api().submit_score(ticket.player_id, request).await,
    )?;
    info!(player_id = ticket.player_id, score, ?phase, "score submitted");
    state.notify(
        NoticeKind::Success,
        ack.message.unwrap_or_else(|| "score submitted".into()),
    );
    snapshots::refresh_player(state, &ticket, RefreshMode::Loud).await;
    Ok(phase)
}

/// Withdraw from the tournament.
pub async fn forfeit(state: &SharedState) -> Result<(), ClientError> {
    let ticket = authorize(state, Action::Forfeit).await?;
    let ack = dispatch(state, state.api().forfeit(ticket.player_id).await)?;
    info!(player_id = ticket.player_id, "participant forfeited");
    state.notify(
        NoticeKind::Info,
        ack.message.unwrap_or_else(|| "you have withdrawn".into()),
    );
    snapshots::refresh_player(state, &ticket, RefreshMode::Loud).await;
    Ok(())
}

/// Choose the song for the current peak match.
pub async fn submit_peak_song(
    state: &SharedState,
    song_name: &str,
    difficulty: u32,
) -> Result<(), ClientError> {
    let ticket = authorize(state, Action::SubmitPeakSong).await?;
    let request = SubmitPeakSongRequest {
        song_name: song_name.trim().to_string(),
        difficulty,
    };
    if let Err(err) = request.validate() {
        let err = ClientError::from(err);
        state.notify_error(&err);
        return Err(err);
    }

    let ack = dispatch(
        state,
        state.api().submit_peak_song(ticket.player_id, request).await,
    )?;
    state.notify(
        NoticeKind::Success,
        ack.message.unwrap_or_else(|| "song submitted".into()),
    );
    snapshots::refresh_match(state, &ticket, RefreshMode::Loud).await;
    Ok(())
}

/// Ban the opponent's revealed peak song.
pub async fn ban_peak_song(state: &SharedState) -> Result<(), ClientError> {
    let ticket = authorize(state, Action::BanPeakSong).await?;
    let ack = dispatch(state, state.api().ban_peak_song(ticket.player_id).await)?;
    state.notify(
        NoticeKind::Success,
        ack.message.unwrap_or_else(|| "opponent song banned".into()),
    );
    snapshots::refresh_match(state, &ticket, RefreshMode::Loud).await;
    Ok(())
}

/// Resolve the session and re-check `action` against the latest snapshots.
async fn authorize(state: &SharedState, action: Action) -> Result<SessionTicket, ClientError> {
    let Some(ticket) = state.current_ticket().await else {
        let err = ClientError::NoSession;
        state.notify_error(&err);
        return Err(err);
    };

    let player = state.player().latest();
    let match_info = state.match_info().latest().flatten();
    if let Err(rejection) = gate::authorize(action, player.as_ref(), match_info.as_ref()) {
        warn!(player_id = ticket.player_id, %action, "command refused locally");
        let err = ClientError::from(rejection);
        state.notify_error(&err);
        return Err(err);
    }
    Ok(ticket)
}

/// Convert a remote outcome, broadcasting failures once.
pub(crate) fn dispatch<T>(
    state: &SharedState,
    result: Result<T, RemoteError>,
) -> Result<T, ClientError> {
    result.map_err(|err| {
        let err = ClientError::from(err);
        warn!(error = %err, "command failed");
        state.notify_error(&err);
        err
    })
}
