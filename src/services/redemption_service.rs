//! Async driver of the card redemption machine.
//!
//! Lock order is always exit gate, then machine. The exit sequence runs in a
//! detached task holding the gate, so it completes even when the caller is
//! dropped, and a scan request issued meanwhile waits on the gate.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    dto::requests::RedeemCardRequest,
    error::ClientError,
    services::snapshots::{self, RefreshMode},
    state::{
        SharedState,
        redemption::{CardEvent, CardState, CardType, InvalidCardTransition, RedemptionMachine},
    },
};

/// Reason shown when the scanner returned nothing usable.
pub const UNREADABLE_CARD: &str = "card could not be read";
/// Reason shown when the card payload is not a reward card.
pub const UNRECOGNIZED_CARD: &str = "unrecognized card";

/// Start looking for a card.
///
/// A result still on screen is dismissed first; the scan starts once its
/// exit has completed.
pub async fn start_scan(state: &SharedState) -> Result<CardState, InvalidCardTransition> {
    loop {
        {
            let _gate = state.exit_gate().lock_owned().await;
            let mut machine = state.redemption().lock().await;
            if !machine.state().is_terminal() {
                return apply(state, &mut machine, CardEvent::ScanStarted);
            }
        }
        begin_exit(state).await;
    }
}

/// Feed the scanner outcome; `None` means the card could not be read.
pub async fn on_card_read(
    state: &SharedState,
    payload: Option<&str>,
) -> Result<CardState, InvalidCardTransition> {
    let event = match payload {
        None => CardEvent::CardUnreadable(UNREADABLE_CARD.into()),
        Some(payload) => match CardType::parse(payload) {
            Some(card) => CardEvent::CardDecoded(card),
            None => {
                debug!("scanned payload is not a reward card");
                CardEvent::CardUnreadable(UNRECOGNIZED_CARD.into())
            }
        },
    };

    let mut machine = state.redemption().lock().await;
    apply(state, &mut machine, event)
}

/// Redeem the card that was found.
///
/// The call runs on its own task: dropping the returned future does not
/// abandon a redemption the service may already have processed.
pub async fn confirm(state: &SharedState) -> Result<CardState, InvalidCardTransition> {
    let card = {
        let mut machine = state.redemption().lock().await;
        let CardState::Found(card) = machine.state().clone() else {
            return Err(InvalidCardTransition {
                from: machine.state().clone(),
                event: CardEvent::RedeemRequested,
            });
        };
        apply(state, &mut machine, CardEvent::RedeemRequested)?;
        card
    };

    let task_state = state.clone();
    let handle = tokio::spawn(async move { redeem(&task_state, card).await });
    match handle.await {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, "redemption task failed");
            let mut machine = state.redemption().lock().await;
            apply(
                state,
                &mut machine,
                CardEvent::RedeemFailed("redemption failed".into()),
            )
        }
    }
}

async fn redeem(state: &SharedState, card: CardType) -> Result<CardState, InvalidCardTransition> {
    let ticket = state.current_ticket().await;
    let outcome = match ticket {
        None => Err(ClientError::NoSession),
        Some(ticket) => state
            .api()
            .redeem_card(
                ticket.player_id,
                RedeemCardRequest {
                    card_type: card.as_str().to_string(),
                },
            )
            .await
            .map_err(ClientError::from),
    };

    let event = match &outcome {
        Ok(_) => {
            info!(card = %card, "card redeemed");
            CardEvent::RedeemSucceeded
        }
        Err(err) => {
            warn!(card = %card, error = %err, "card redemption failed");
            CardEvent::RedeemFailed(err.user_message())
        }
    };
    let next = {
        let mut machine = state.redemption().lock().await;
        apply(state, &mut machine, event)?
    };

    if let (Ok(_), Some(ticket)) = (&outcome, ticket) {
        snapshots::refresh_player(state, &ticket, RefreshMode::Loud).await;
    }
    Ok(next)
}

/// Close the overlay without redeeming.
pub async fn cancel(state: &SharedState) -> Result<CardState, InvalidCardTransition> {
    let mut machine = state.redemption().lock().await;
    apply(state, &mut machine, CardEvent::Cancelled)
}

/// Leave a terminal state through the exit sequence.
///
/// Does nothing outside `Success`/`Error`; waits for an exit already running.
pub async fn dismiss(state: &SharedState) {
    begin_exit(state).await;
}

async fn begin_exit(state: &SharedState) {
    let gate = state.exit_gate().lock_owned().await;
    let mut machine = state.redemption().lock().await;
    if apply(state, &mut machine, CardEvent::ExitStarted).is_err() {
        return;
    }

    let exit = state.config().redemption_exit();
    let task_state = state.clone();
    tokio::spawn(async move {
        sleep(exit).await;
        {
            let mut machine = task_state.redemption().lock().await;
            if let Err(err) = apply(&task_state, &mut machine, CardEvent::ExitCompleted) {
                warn!(error = %err, "redemption exit could not complete");
            }
        }
        drop(gate);
    });
}

fn apply(
    state: &SharedState,
    machine: &mut RedemptionMachine,
    event: CardEvent,
) -> Result<CardState, InvalidCardTransition> {
    let next = machine.apply(event)?;
    state.publish_card_state(next.clone());
    Ok(next)
}
