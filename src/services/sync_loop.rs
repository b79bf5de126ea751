//! Background synchronization bound to one logged-in session.

use std::sync::Arc;

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at, sleep},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    services::snapshots::{self, RefreshMode},
    state::{EngineState, SessionTicket, SharedState},
};

/// Keep the snapshots of `ticket`'s session fresh until `token` is cancelled.
///
/// The participant is fetched immediately, then every tick fetches the
/// participant, the match and the song draw in that order. Returns only after
/// the fast draw poller it may have spawned has stopped.
pub async fn run(state: SharedState, ticket: SessionTicket, token: CancellationToken) {
    let player_id = ticket.player_id;
    info!(player_id, "sync loop started");

    let mut poller: Option<JoinHandle<()>> = None;
    let period = state.config().poll_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::select! {
        _ = token.cancelled() => {}
        _ = snapshots::refresh_player(&state, &ticket, RefreshMode::Quiet) => {}
    }

    while !token.is_cancelled() {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = token.cancelled() => break,
            rolling = tick(&state, &ticket) => {
                if rolling && state.claim_fast_draw_polling() {
                    if let Some(previous) = poller.take() {
                        let _ = previous.await;
                    }
                    debug!(player_id, "song draw rolling; starting fast poller");
                    poller = Some(tokio::spawn(poll_rolling_draw(
                        state.clone(),
                        ticket,
                        token.child_token(),
                    )));
                }
            }
        }
    }

    if let Some(poller) = poller {
        let _ = poller.await;
    }
    info!(player_id, "sync loop stopped");
}

/// One poll cycle; returns whether a rolling draw was observed.
async fn tick(state: &EngineState, ticket: &SessionTicket) -> bool {
    snapshots::refresh_player(state, ticket, RefreshMode::Quiet).await;
    snapshots::refresh_match(state, ticket, RefreshMode::Quiet).await;

    // the fast poller owns the draw while it runs
    if state.is_fast_draw_polling() {
        return false;
    }
    snapshots::refresh_song_draw(state, ticket)
        .await
        .is_some_and(|draw| draw.is_rolling())
}

/// Poll the song draw alone until it stops rolling.
///
/// The caller claims the poller slot; it is released on every exit path.
async fn poll_rolling_draw(state: Arc<EngineState>, ticket: SessionTicket, token: CancellationToken) {
    let period = state.config().draw_poll_interval();
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = sleep(period) => {}
        }

        let draw = tokio::select! {
            _ = token.cancelled() => break,
            draw = snapshots::refresh_song_draw(&state, &ticket) => draw,
        };
        match draw {
            Some(draw) if !draw.is_rolling() => {
                debug!(status = ?draw.status, "song draw settled; stopping fast poller");
                break;
            }
            // failures keep polling until the parent stops us
            _ => {}
        }
    }
    state.release_fast_draw_polling();
}
