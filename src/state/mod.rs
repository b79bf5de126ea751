pub mod gate;
pub mod loadable;
pub mod promotion;
pub mod redemption;

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    dao::remote::TournamentApi,
    dto::{
        auth::AuthStatus, match_info::MatchInfo, player::Player, ranking::RankingItem,
        song_draw::SongDrawState,
    },
    error::ClientError,
    services::session::SessionService,
};

use self::{
    gate::Permissions,
    loadable::{Loadable, ResultCell},
    redemption::{CardState, RedemptionMachine},
};

/// Engine state shared between tasks.
pub type SharedState = Arc<EngineState>;

const NOTICE_CAPACITY: usize = 32;
const SCANNED_NAME_CAPACITY: usize = 8;

/// Identifies one logged-in session; fetches carry it and are dropped on
/// arrival when it is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    /// Participant the session belongs to.
    pub player_id: u32,
    /// Distinguishes successive sessions of the same participant.
    pub epoch: Uuid,
}

#[derive(Debug)]
struct ActiveSession {
    ticket: SessionTicket,
    last_match_number: Option<u32>,
}

/// Severity of a participant-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Neutral information.
    Info,
    /// A command went through.
    Success,
    /// Something failed.
    Error,
}

/// Transient message for the participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Text shown to the participant.
    pub text: String,
}

/// Central client state: the remote contract, the session, and every
/// snapshot the engine exposes.
pub struct EngineState {
    api: Arc<dyn TournamentApi>,
    config: ClientConfig,
    session: SessionService,
    active: Mutex<Option<ActiveSession>>,
    player: ResultCell<Player>,
    match_info: ResultCell<Option<MatchInfo>>,
    song_draw: ResultCell<SongDrawState>,
    rankings: ResultCell<Vec<RankingItem>>,
    auth_check: ResultCell<AuthStatus>,
    notices: broadcast::Sender<Notice>,
    match_numbers: mpsc::UnboundedSender<u32>,
    match_numbers_rx: Mutex<Option<mpsc::UnboundedReceiver<u32>>>,
    scanned_names: broadcast::Sender<String>,
    fast_draw_polling: watch::Sender<bool>,
    redemption: Mutex<RedemptionMachine>,
    card_state: watch::Sender<CardState>,
    exit_gate: Arc<Mutex<()>>,
}

impl EngineState {
    /// Construct a new [`EngineState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        api: Arc<dyn TournamentApi>,
        session: SessionService,
        config: ClientConfig,
    ) -> SharedState {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let (scanned_names, _) = broadcast::channel(SCANNED_NAME_CAPACITY);
        let (match_numbers, match_numbers_rx) = mpsc::unbounded_channel();
        let (fast_draw_polling, _) = watch::channel(false);
        let (card_state, _) = watch::channel(CardState::Idle);

        Arc::new(Self {
            api,
            config,
            session,
            active: Mutex::new(None),
            player: ResultCell::default(),
            match_info: ResultCell::default(),
            song_draw: ResultCell::default(),
            rankings: ResultCell::default(),
            auth_check: ResultCell::default(),
            notices,
            match_numbers,
            match_numbers_rx: Mutex::new(Some(match_numbers_rx)),
            scanned_names,
            fast_draw_polling,
            redemption: Mutex::new(RedemptionMachine::new()),
            card_state,
            exit_gate: Arc::new(Mutex::new(())),
        })
    }

    /// Remote tournament service.
    pub fn api(&self) -> &Arc<dyn TournamentApi> {
        &self.api
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Persisted session identity.
    pub fn session(&self) -> &SessionService {
        &self.session
    }

    /// Start a new session scope for `player_id`, discarding every snapshot
    /// of the previous one.
    pub async fn begin_session(&self, player_id: u32) -> SessionTicket {
        let ticket = SessionTicket {
            player_id,
            epoch: Uuid::new_v4(),
        };
        let mut active = self.active.lock().await;
        *active = Some(ActiveSession {
            ticket,
            last_match_number: None,
        });
        self.reset_session_cells();
        info!(player_id, epoch = %ticket.epoch, "session started");
        ticket
    }

    /// Close the current session scope; late results of it are dropped.
    pub async fn end_session(&self) {
        let mut active = self.active.lock().await;
        if let Some(session) = active.take() {
            info!(player_id = session.ticket.player_id, "session ended");
        }
        self.reset_session_cells();
    }

    /// Ticket of the running session, if any.
    pub async fn current_ticket(&self) -> Option<SessionTicket> {
        self.active.lock().await.as_ref().map(|session| session.ticket)
    }

    fn reset_session_cells(&self) {
        self.player.replace(Loadable::Loading);
        self.match_info.replace(Loadable::Loading);
        self.song_draw.replace(Loadable::Loading);
    }

    /// Publish a participant fetch made under `ticket`.
    ///
    /// Returns whether the result was accepted. Failures only end a pending
    /// `Loading`; an earlier snapshot stays in place.
    pub async fn publish_player(
        &self,
        ticket: &SessionTicket,
        result: Result<Player, ClientError>,
    ) -> bool {
        let mut active = self.active.lock().await;
        let Some(session) = active
            .as_mut()
            .filter(|session| session.ticket == *ticket)
        else {
            debug!(player_id = ticket.player_id, "dropping stale participant snapshot");
            return false;
        };

        match result {
            Ok(player) => {
                let previous = session.last_match_number;
                if let (Some(previous), Some(current)) = (previous, player.match_number) {
                    if previous != current {
                        info!(
                            player_id = ticket.player_id,
                            previous, current, "match number reassigned"
                        );
                        let _ = self.match_numbers.send(current);
                    }
                }
                session.last_match_number = player.match_number;
                self.player.replace(Loadable::Success(player));
            }
            Err(err) => {
                debug!(player_id = ticket.player_id, error = %err, "participant refresh failed");
                self.player.fail_if_loading(err.user_message());
            }
        }
        true
    }

    /// Publish a match fetch made under `ticket`.
    pub async fn publish_match(
        &self,
        ticket: &SessionTicket,
        result: Result<Option<MatchInfo>, ClientError>,
    ) -> bool {
        let active = self.active.lock().await;
        if !is_current(&active, ticket) {
            debug!(player_id = ticket.player_id, "dropping stale match snapshot");
            return false;
        }

        match result {
            Ok(info) => {
                self.match_info.replace(Loadable::Success(info));
            }
            Err(err) => {
                debug!(player_id = ticket.player_id, error = %err, "match refresh failed");
                self.match_info.fail_if_loading(err.user_message());
            }
        }
        true
    }

    /// Publish a song draw fetch made under `ticket`.
    pub async fn publish_song_draw(
        &self,
        ticket: &SessionTicket,
        result: Result<SongDrawState, ClientError>,
    ) -> bool {
        let active = self.active.lock().await;
        if !is_current(&active, ticket) {
            debug!(player_id = ticket.player_id, "dropping stale song draw snapshot");
            return false;
        }

        match result {
            Ok(draw) => {
                self.song_draw.replace(Loadable::Success(draw));
            }
            Err(err) => {
                debug!(error = %err, "song draw refresh failed");
                self.song_draw.fail_if_loading(err.user_message());
            }
        }
        true
    }

    /// Participant snapshot of the current session.
    pub fn player(&self) -> &ResultCell<Player> {
        &self.player
    }

    /// Active match of the current session, `None` outside a pairing.
    pub fn match_info(&self) -> &ResultCell<Option<MatchInfo>> {
        &self.match_info
    }

    /// Latest song draw, whatever its division.
    pub fn song_draw(&self) -> &ResultCell<SongDrawState> {
        &self.song_draw
    }

    /// Last loaded leaderboard.
    pub fn rankings(&self) -> &ResultCell<Vec<RankingItem>> {
        &self.rankings
    }

    /// Result of the last auth check.
    pub fn auth_check(&self) -> &ResultCell<AuthStatus> {
        &self.auth_check
    }

    /// Permissions derived from the latest snapshots.
    pub fn permissions(&self) -> Permissions {
        let player = self.player.latest();
        let match_info = self.match_info.latest().flatten();
        Permissions::derive(player.as_ref(), match_info.as_ref())
    }

    /// The latest song draw if it concerns the participant's group.
    pub fn visible_song_draw(&self) -> Option<SongDrawState> {
        let draw = self.song_draw.latest()?;
        let visible = match self.player.latest() {
            Some(player) => draw.is_visible_to(player.group),
            None => draw.group.is_none(),
        };
        visible.then_some(draw)
    }

    /// Broadcast a participant-facing message.
    pub fn notify(&self, kind: NoticeKind, text: impl Into<String>) {
        let notice = Notice {
            kind,
            text: text.into(),
        };
        debug!(kind = ?notice.kind, text = %notice.text, "notice");
        // no subscriber is fine
        let _ = self.notices.send(notice);
    }

    /// Broadcast the participant-facing text of `err`.
    pub fn notify_error(&self, err: &ClientError) {
        self.notify(NoticeKind::Error, err.user_message());
    }

    /// Participant-facing messages from now on.
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Take the single consumer of match number reassignments.
    ///
    /// Returns `None` once taken.
    pub async fn take_match_number_changes(&self) -> Option<mpsc::UnboundedReceiver<u32>> {
        self.match_numbers_rx.lock().await.take()
    }

    pub(crate) fn announce_scanned_name(&self, name: String) {
        let _ = self.scanned_names.send(name);
    }

    /// Names resolved from scanned participant codes.
    pub fn subscribe_scanned_names(&self) -> broadcast::Receiver<String> {
        self.scanned_names.subscribe()
    }

    /// Whether the fast song draw poller is running.
    pub fn is_fast_draw_polling(&self) -> bool {
        *self.fast_draw_polling.borrow()
    }

    /// Follow the fast song draw poller starting and stopping.
    pub fn watch_fast_draw_polling(&self) -> watch::Receiver<bool> {
        self.fast_draw_polling.subscribe()
    }

    /// Claim the fast poller slot; `false` when a poller already runs.
    pub(crate) fn claim_fast_draw_polling(&self) -> bool {
        self.fast_draw_polling.send_if_modified(|running| {
            if *running {
                false
            } else {
                *running = true;
                true
            }
        })
    }

    pub(crate) fn release_fast_draw_polling(&self) {
        self.fast_draw_polling.send_replace(false);
    }

    pub(crate) fn redemption(&self) -> &Mutex<RedemptionMachine> {
        &self.redemption
    }

    pub(crate) fn exit_gate(&self) -> Arc<Mutex<()>> {
        self.exit_gate.clone()
    }

    pub(crate) fn publish_card_state(&self, state: CardState) {
        self.card_state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    /// Current redemption overlay state.
    pub fn card_state(&self) -> CardState {
        self.card_state.borrow().clone()
    }

    /// Follow the redemption overlay.
    pub fn watch_card_state(&self) -> watch::Receiver<CardState> {
        self.card_state.subscribe()
    }
}

fn is_current(active: &Option<ActiveSession>, ticket: &SessionTicket) -> bool {
    active
        .as_ref()
        .is_some_and(|session| session.ticket == *ticket)
}
