//! Contactless card redemption flow.
//!
//! The machine is pure: the async driver in
//! [`crate::services::redemption_service`] performs the scanner, network and
//! timing work and feeds the outcomes back in as [`CardEvent`]s.

use std::fmt;

use thiserror::Error;

/// URI-style prefix of a reward card payload.
pub const CARD_PAYLOAD_PREFIX: &str = "gamesign:card/";

/// Kind of reward printed on a card, e.g. `ban`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardType(String);

impl CardType {
    /// Decode a card payload of the form `gamesign:card/<type>`.
    ///
    /// The type is ASCII alphanumeric plus `_` and `-`; anything else is an
    /// unrecognized card.
    pub fn parse(payload: &str) -> Option<Self> {
        let kind = payload.trim().strip_prefix(CARD_PAYLOAD_PREFIX)?;
        let valid = !kind.is_empty()
            && kind.len() <= 32
            && kind
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| CardType(kind.to_ascii_lowercase()))
    }

    /// Card type as sent to the service.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visible state of the redemption overlay.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CardState {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Waiting for the card to be read.
    Reading,
    /// A recognized card was read and awaits confirmation.
    Found(CardType),
    /// The card was redeemed.
    Success,
    /// Reading or redeeming failed.
    Error(String),
}

impl CardState {
    /// Terminal visual states, left only through the exit sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CardState::Success | CardState::Error(_))
    }
}

/// Inputs to the redemption machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardEvent {
    /// The scanner started looking for a card.
    ScanStarted,
    /// The scanner decoded a recognized card.
    CardDecoded(CardType),
    /// The scanner could not read or recognize the card.
    CardUnreadable(String),
    /// The participant confirmed; the redeem call is about to be sent.
    RedeemRequested,
    /// The redeem call succeeded.
    RedeemSucceeded,
    /// The redeem call failed or was rejected.
    RedeemFailed(String),
    /// The participant dismissed the overlay.
    Cancelled,
    /// The exit sequence started.
    ExitStarted,
    /// The exit sequence finished.
    ExitCompleted,
}

/// Error returned when an event does not apply to the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid card transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidCardTransition {
    /// State when the event arrived.
    pub from: CardState,
    /// The refused event.
    pub event: CardEvent,
}

/// Redemption state machine.
#[derive(Debug, Clone, Default)]
pub struct RedemptionMachine {
    state: CardState,
    redeeming: bool,
    exiting: bool,
}

impl RedemptionMachine {
    /// Create a machine in [`CardState::Idle`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &CardState {
        &self.state
    }

    /// A redeem call is in flight.
    pub fn is_redeeming(&self) -> bool {
        self.redeeming
    }

    /// The exit sequence is running.
    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    /// Apply `event`, returning the resulting state.
    pub fn apply(&mut self, event: CardEvent) -> Result<CardState, InvalidCardTransition> {
        let invalid = |from: &CardState, event: CardEvent| InvalidCardTransition {
            from: from.clone(),
            event,
        };

        let next = match (&self.state, event) {
            (CardState::Idle, CardEvent::ScanStarted) => CardState::Reading,
            (CardState::Reading, CardEvent::CardDecoded(card)) => CardState::Found(card),
            (CardState::Reading, CardEvent::CardUnreadable(reason)) => CardState::Error(reason),
            (CardState::Reading, CardEvent::Cancelled) => CardState::Idle,
            (CardState::Found(_), CardEvent::RedeemRequested) if !self.redeeming => {
                self.redeeming = true;
                return Ok(self.state.clone());
            }
            (CardState::Found(_), CardEvent::RedeemSucceeded) if self.redeeming => {
                self.redeeming = false;
                CardState::Success
            }
            (CardState::Found(_), CardEvent::RedeemFailed(reason)) if self.redeeming => {
                self.redeeming = false;
                CardState::Error(reason)
            }
            (CardState::Found(_), CardEvent::Cancelled) if !self.redeeming => CardState::Idle,
            (CardState::Success | CardState::Error(_), CardEvent::ExitStarted) if !self.exiting => {
                self.exiting = true;
                return Ok(self.state.clone());
            }
            (CardState::Success | CardState::Error(_), CardEvent::ExitCompleted)
                if self.exiting =>
            {
                self.exiting = false;
                CardState::Idle
            }
            (from, event) => return Err(invalid(from, event)),
        };

        self.state = next;
        Ok(self.state.clone())
    }
}
