//! Contract of the remote tournament service and its HTTP client.

mod error;
mod http;

pub use error::{RemoteError, RemoteResult};
pub use http::HttpTournamentApi;

use futures::future::BoxFuture;

use crate::dto::{
    auth::{AuthStatus, LoginOutcome, MachineStatus},
    envelope::Ack,
    match_info::MatchInfo,
    player::{Group, Player, PlayerFilter},
    ranking::RankingItem,
    requests::{
        LoginRequest, RedeemCardRequest, RegisterRequest, SubmitPeakSongRequest,
        SubmitScoreRequest,
    },
    song_draw::SongDrawState,
};

/// Black-box contract of the remote tournament service.
pub trait TournamentApi: Send + Sync {
    /// Whether `name` exists and has a password.
    fn check_status(&self, name: String) -> BoxFuture<'static, RemoteResult<AuthStatus>>;
    /// Log in with a password.
    fn login(&self, request: LoginRequest) -> BoxFuture<'static, RemoteResult<LoginOutcome>>;
    /// Set a password and optional avatar.
    fn register(&self, request: RegisterRequest) -> BoxFuture<'static, RemoteResult<LoginOutcome>>;
    /// Check in by name.
    fn check_in(&self, name: String) -> BoxFuture<'static, RemoteResult<Ack<Player>>>;
    /// Participant snapshot by id.
    fn player(&self, id: u32) -> BoxFuture<'static, RemoteResult<Player>>;
    /// Participant snapshot by name.
    fn search_player(&self, name: String) -> BoxFuture<'static, RemoteResult<Player>>;
    /// Participants matching `filter`.
    fn list_players(&self, filter: PlayerFilter) -> BoxFuture<'static, RemoteResult<Vec<Player>>>;
    /// Take or leave a competition station.
    fn toggle_machine(&self, id: u32) -> BoxFuture<'static, RemoteResult<Ack<MachineStatus>>>;
    /// Submit a score for the phase in the request.
    fn submit_score(
        &self,
        id: u32,
        request: SubmitScoreRequest,
    ) -> BoxFuture<'static, RemoteResult<Ack>>;
    /// Withdraw from the tournament.
    fn forfeit(&self, id: u32) -> BoxFuture<'static, RemoteResult<Ack>>;
    /// Active match, `None` outside a pairing.
    fn player_match(&self, id: u32) -> BoxFuture<'static, RemoteResult<Option<MatchInfo>>>;
    /// Choose the song for a peak match.
    fn submit_peak_song(
        &self,
        id: u32,
        request: SubmitPeakSongRequest,
    ) -> BoxFuture<'static, RemoteResult<Ack>>;
    /// Ban the opponent's revealed song.
    fn ban_peak_song(&self, id: u32) -> BoxFuture<'static, RemoteResult<Ack>>;
    /// Redeem a reward card.
    fn redeem_card(
        &self,
        id: u32,
        request: RedeemCardRequest,
    ) -> BoxFuture<'static, RemoteResult<Ack>>;
    /// Leaderboard, optionally for one division.
    fn rankings(&self, group: Option<Group>) -> BoxFuture<'static, RemoteResult<Vec<RankingItem>>>;
    /// Global song draw snapshot.
    fn song_draw_state(&self) -> BoxFuture<'static, RemoteResult<SongDrawState>>;
}
