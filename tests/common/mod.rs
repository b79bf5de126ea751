#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::future::BoxFuture;
use tokio::sync::Notify;

use gamesign_client::{
    config::ClientConfig,
    dao::{
        remote::{RemoteError, RemoteResult, TournamentApi},
        session_store::InMemoryKeyValueStore,
    },
    dto::{
        auth::{AuthStatus, LoginOutcome, MachineStatus},
        envelope::Ack,
        match_info::{MatchInfo, SongSelection},
        player::{Group, Player, PlayerFilter},
        ranking::RankingItem,
        requests::{
            LoginRequest, RedeemCardRequest, RegisterRequest, SubmitPeakSongRequest,
            SubmitScoreRequest,
        },
        song_draw::SongDrawState,
    },
    services::session::SessionService,
    state::{EngineState, SharedState, promotion::ScorePhase},
};

pub const PASSWORD: &str = "hunter2";

#[derive(Default)]
struct Inner {
    players: Mutex<HashMap<u32, Player>>,
    matches: Mutex<HashMap<u32, MatchInfo>>,
    song_draw: Mutex<SongDrawState>,
    calls: Mutex<Vec<String>>,
    blocked: Mutex<HashMap<u32, Arc<Notify>>>,
    rejection: Mutex<Option<String>>,
}

/// In-memory tournament service behaving like the real one for the routes the
/// client uses.
#[derive(Clone, Default)]
pub struct FakeApi {
    inner: Arc<Inner>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_players(players: impl IntoIterator<Item = Player>) -> Self {
        let api = Self::new();
        for player in players {
            api.put_player(player);
        }
        api
    }

    pub fn put_player(&self, player: Player) {
        self.inner.players.lock().unwrap().insert(player.id, player);
    }

    pub fn update_player(&self, id: u32, edit: impl FnOnce(&mut Player)) {
        let mut players = self.inner.players.lock().unwrap();
        edit(players.get_mut(&id).expect("unknown player"));
    }

    pub fn stored_player(&self, id: u32) -> Player {
        self.inner.players.lock().unwrap()[&id].clone()
    }

    pub fn put_match(&self, player_id: u32, info: MatchInfo) {
        self.inner.matches.lock().unwrap().insert(player_id, info);
    }

    pub fn set_song_draw(&self, draw: SongDrawState) {
        *self.inner.song_draw.lock().unwrap() = draw;
    }

    /// Reject the next command with `message`.
    pub fn reject_next(&self, message: &str) {
        *self.inner.rejection.lock().unwrap() = Some(message.to_string());
    }

    /// Hold every fetch of `id` until [`FakeApi::release_player`].
    pub fn block_player(&self, id: u32) {
        self.inner
            .blocked
            .lock()
            .unwrap()
            .insert(id, Arc::new(Notify::new()));
    }

    pub fn release_player(&self, id: u32) {
        if let Some(notify) = self.inner.blocked.lock().unwrap().remove(&id) {
            notify.notify_waiters();
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Wait (in virtual time) until `prefix` was called `times` times.
    pub async fn wait_for(&self, prefix: &str, times: usize) {
        for _ in 0..1_000 {
            if self.count(prefix) >= times {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("`{prefix}` was called {} times, expected {times}", self.count(prefix));
    }
}

impl Inner {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_rejection(&self) -> RemoteResult<()> {
        match self.rejection.lock().unwrap().take() {
            Some(message) => Err(RemoteError::Rejected {
                code: 400,
                message: Some(message),
            }),
            None => Ok(()),
        }
    }

    fn not_found() -> RemoteError {
        RemoteError::Rejected {
            code: 404,
            message: Some("player not found".into()),
        }
    }

    fn edit_player<T>(&self, id: u32, edit: impl FnOnce(&mut Player) -> T) -> RemoteResult<T> {
        let mut players = self.players.lock().unwrap();
        players.get_mut(&id).map(edit).ok_or_else(Self::not_found)
    }

    fn find_by_name(&self, name: &str) -> Option<Player> {
        self.players
            .lock()
            .unwrap()
            .values()
            .find(|player| player.name == name)
            .cloned()
    }
}

impl TournamentApi for FakeApi {
    fn check_status(&self, name: String) -> BoxFuture<'static, RemoteResult<AuthStatus>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("check_status:{name}"));
            let exists = inner.find_by_name(&name).is_some();
            Ok(AuthStatus {
                exists,
                registered: exists,
                avatar_url: None,
            })
        })
    }

    fn login(&self, request: LoginRequest) -> BoxFuture<'static, RemoteResult<LoginOutcome>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("login:{}", request.name));
            let success = inner.find_by_name(&request.name).is_some() && request.password == PASSWORD;
            Ok(LoginOutcome {
                success,
                msg: if success { "ok".into() } else { "wrong password".into() },
            })
        })
    }

    fn register(&self, request: RegisterRequest) -> BoxFuture<'static, RemoteResult<LoginOutcome>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("register:{}", request.name));
            Ok(LoginOutcome {
                success: inner.find_by_name(&request.name).is_some(),
                msg: "registered".into(),
            })
        })
    }

    fn check_in(&self, name: String) -> BoxFuture<'static, RemoteResult<Ack<Player>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("check_in:{name}"));
            let id = inner.find_by_name(&name).ok_or_else(Inner::not_found)?.id;
            let player = inner.edit_player(id, |player| {
                player.checked_in = true;
                player.clone()
            })?;
            Ok(Ack {
                data: player,
                message: Some("check-in successful".into()),
            })
        })
    }

    fn player(&self, id: u32) -> BoxFuture<'static, RemoteResult<Player>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("player:{id}"));
            let blocker = inner.blocked.lock().unwrap().get(&id).cloned();
            if let Some(blocker) = blocker {
                blocker.notified().await;
            }
            inner
                .players
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(Inner::not_found)
        })
    }

    fn search_player(&self, name: String) -> BoxFuture<'static, RemoteResult<Player>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("search:{name}"));
            inner.find_by_name(&name).ok_or_else(Inner::not_found)
        })
    }

    fn list_players(&self, filter: PlayerFilter) -> BoxFuture<'static, RemoteResult<Vec<Player>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record("list_players".into());
            let mut players: Vec<Player> = inner
                .players
                .lock()
                .unwrap()
                .values()
                .filter(|player| filter.group.is_none_or(|group| player.group == group))
                .filter(|player| filter.checked_in.is_none_or(|flag| player.checked_in == flag))
                .cloned()
                .collect();
            players.sort_by_key(|player| player.id);
            Ok(players)
        })
    }

    fn toggle_machine(&self, id: u32) -> BoxFuture<'static, RemoteResult<Ack<MachineStatus>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("toggle_machine:{id}"));
            inner.take_rejection()?;
            let on_machine = inner.edit_player(id, |player| {
                player.on_machine = !player.on_machine;
                player.on_machine
            })?;
            Ok(Ack {
                data: MachineStatus { on_machine },
                message: None,
            })
        })
    }

    fn submit_score(
        &self,
        id: u32,
        request: SubmitScoreRequest,
    ) -> BoxFuture<'static, RemoteResult<Ack>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let phase = match request.phase {
                ScorePhase::Round1 => "round1",
                ScorePhase::Revival => "revival",
            };
            inner.record(format!("submit_score:{id}:{phase}"));
            inner.take_rejection()?;
            inner.edit_player(id, |player| {
                match request.phase {
                    ScorePhase::Round1 => player.score_round1 = Some(request.score),
                    ScorePhase::Revival => player.score_revival = Some(request.score),
                }
                player.on_machine = false;
            })?;
            Ok(Ack::empty(Some("score submitted".into())))
        })
    }

    fn forfeit(&self, id: u32) -> BoxFuture<'static, RemoteResult<Ack>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("forfeit:{id}"));
            inner.take_rejection()?;
            inner.edit_player(id, |player| player.forfeited = true)?;
            Ok(Ack::empty(None))
        })
    }

    fn player_match(&self, id: u32) -> BoxFuture<'static, RemoteResult<Option<MatchInfo>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("match:{id}"));
            Ok(inner.matches.lock().unwrap().get(&id).cloned())
        })
    }

    fn submit_peak_song(
        &self,
        id: u32,
        request: SubmitPeakSongRequest,
    ) -> BoxFuture<'static, RemoteResult<Ack>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("submit_peak_song:{id}"));
            inner.take_rejection()?;
            if let Some(info) = inner.matches.lock().unwrap().get_mut(&id) {
                info.my_selection = Some(SongSelection {
                    song_name: request.song_name,
                    difficulty: request.difficulty,
                    hidden: false,
                });
            }
            Ok(Ack::empty(None))
        })
    }

    fn ban_peak_song(&self, id: u32) -> BoxFuture<'static, RemoteResult<Ack>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("ban_peak_song:{id}"));
            inner.take_rejection()?;
            if let Some(info) = inner.matches.lock().unwrap().get_mut(&id) {
                info.has_banned_this_match = true;
                info.ban_used = true;
            }
            Ok(Ack::empty(Some("banned".into())))
        })
    }

    fn redeem_card(
        &self,
        id: u32,
        request: RedeemCardRequest,
    ) -> BoxFuture<'static, RemoteResult<Ack>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record(format!("redeem_card:{id}:{}", request.card_type));
            inner.take_rejection()?;
            inner.edit_player(id, |player| player.ban_used = false)?;
            Ok(Ack::empty(None))
        })
    }

    fn rankings(&self, group: Option<Group>) -> BoxFuture<'static, RemoteResult<Vec<RankingItem>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record("rankings".into());
            let mut players: Vec<Player> = inner
                .players
                .lock()
                .unwrap()
                .values()
                .filter(|player| group.is_none_or(|group| player.group == group))
                .cloned()
                .collect();
            players.sort_by_key(|player| player.id);
            Ok(players
                .into_iter()
                .enumerate()
                .map(|(index, player)| RankingItem {
                    rank: index as u32 + 1,
                    name: player.name,
                    group: player.group,
                    group_label: None,
                    match_number: player.match_number,
                    score: player.score_round1,
                    status: None,
                    forfeited: player.forfeited,
                })
                .collect())
        })
    }

    fn song_draw_state(&self) -> BoxFuture<'static, RemoteResult<SongDrawState>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.record("song_draw".into());
            Ok(inner.song_draw.lock().unwrap().clone())
        })
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::default()
}

/// Engine over `api` with an in-memory session store.
pub fn engine(api: &FakeApi) -> SharedState {
    let session = SessionService::new(Arc::new(InMemoryKeyValueStore::new()));
    EngineState::new(Arc::new(api.clone()), session, config())
}

pub fn player(id: u32, name: &str, group: Group) -> Player {
    Player {
        id,
        name: name.into(),
        group,
        checked_in: true,
        ..Player::default()
    }
}
