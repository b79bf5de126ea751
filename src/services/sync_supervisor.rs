//! Starts and stops the sync loop as the session identity changes.

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    services::sync_loop,
    state::{SessionTicket, SharedState},
};

struct RunningLoop {
    ticket: SessionTicket,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunningLoop {
    async fn stop(self) {
        self.token.cancel();
        if let Err(err) = self.handle.await {
            debug!(player_id = self.ticket.player_id, error = %err, "sync loop task ended abnormally");
        }
    }
}

/// Spawn the supervisor on the runtime.
pub fn spawn(state: SharedState, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(run(state, shutdown))
}

/// Own at most one sync loop, keyed by the logged-in participant id.
///
/// On every identity change the running loop is cancelled and awaited before
/// a loop for the new identity starts, so two loops never overlap.
pub async fn run(state: SharedState, shutdown: CancellationToken) {
    let mut identities = WatchStream::new(state.session().subscribe());
    let mut current: Option<RunningLoop> = None;

    loop {
        let identity = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = identities.next() => match next {
                Some(identity) => identity,
                None => break,
            },
        };

        let wanted = identity.map(|identity| identity.player_id);
        let active = state.current_ticket().await;
        // a session closed elsewhere (logout) must restart even for the same id
        let unchanged = match &current {
            Some(running) => Some(running.ticket.player_id) == wanted && active == Some(running.ticket),
            None => wanted.is_none(),
        };
        if unchanged {
            continue;
        }

        if let Some(running) = current.take() {
            running.stop().await;
            state.end_session().await;
        }

        if let Some(player_id) = wanted {
            let ticket = state.begin_session(player_id).await;
            let token = shutdown.child_token();
            let handle = tokio::spawn(sync_loop::run(state.clone(), ticket, token.clone()));
            current = Some(RunningLoop {
                ticket,
                token,
                handle,
            });
        }
    }

    if let Some(running) = current.take() {
        running.stop().await;
        state.end_session().await;
    }
    info!("sync supervisor stopped");
}
