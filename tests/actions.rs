mod common;

use common::{FakeApi, PASSWORD, engine, player};
use gamesign_client::{
    dto::{
        match_info::{MatchInfo, MatchOpponent, SongSelection},
        player::{Group, Player, PlayerFilter},
    },
    error::{ClientError, NOT_AVAILABLE_MESSAGE},
    services::{
        actions, auth_service, public_service, scanner,
        snapshots::{self, RefreshMode},
    },
    state::{
        NoticeKind, SharedState,
        gate::Action,
        loadable::Loadable,
        promotion::{PromotionStatus, ScorePhase},
    },
};

async fn logged_in(api: &FakeApi, id: u32) -> SharedState {
    let state = engine(api);
    let ticket = state.begin_session(id).await;
    assert!(snapshots::refresh_player(&state, &ticket, RefreshMode::Quiet).await);
    state
}

fn on_machine(mut player: Player) -> Player {
    player.on_machine = true;
    player
}

#[tokio::test]
async fn qualifying_score_submission() {
    let api = FakeApi::with_players([on_machine(player(7, "mio", Group::Beginner))]);
    let state = logged_in(&api, 7).await;
    assert!(state.permissions().submit_score);

    let phase = actions::submit_score(&state, 0.9512).await.unwrap();
    assert_eq!(phase, ScorePhase::Round1);
    assert_eq!(api.count("submit_score:7:round1"), 1);

    let refreshed = state.player().latest().unwrap();
    assert_eq!(refreshed.score_round1, Some(0.9512));
    assert!(!refreshed.on_machine);
    assert!(!state.permissions().submit_score);

    let again = actions::submit_score(&state, 0.99).await.unwrap_err();
    assert!(matches!(again, ClientError::NotAvailable(_)));
    assert_eq!(api.count("submit_score"), 1);
}

#[tokio::test]
async fn revival_score_uses_revival_phase() {
    let mut mio = on_machine(player(7, "mio", Group::Advanced));
    mio.promotion_status = Some(PromotionStatus::Revival);
    mio.score_round1 = Some(0.81);
    let api = FakeApi::with_players([mio]);
    let state = logged_in(&api, 7).await;
    assert!(state.permissions().show_machine_button);

    let phase = actions::submit_score(&state, 0.93).await.unwrap();
    assert_eq!(phase, ScorePhase::Revival);
    assert_eq!(api.count("submit_score:7:revival"), 1);

    let refreshed = state.player().latest().unwrap();
    assert_eq!(refreshed.score_revival, Some(0.93));
    assert_eq!(refreshed.score_round1, Some(0.81));
    assert!(!state.permissions().show_machine_button);
    assert!(!state.permissions().submit_score);
}

#[tokio::test]
async fn refused_commands_never_reach_the_network() {
    let mut mio = player(7, "mio", Group::Advanced);
    mio.promotion_status = Some(PromotionStatus::Eliminated);
    let api = FakeApi::with_players([mio]);
    let state = logged_in(&api, 7).await;
    let mut notices = state.subscribe_notices();

    for result in [
        actions::forfeit(&state).await,
        actions::toggle_machine(&state).await.map(|_| ()),
        actions::submit_score(&state, 0.5).await.map(|_| ()),
        actions::ban_peak_song(&state).await,
        actions::submit_peak_song(&state, "Testify", 12).await,
    ] {
        assert!(matches!(result, Err(ClientError::NotAvailable(_))));
        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, NOT_AVAILABLE_MESSAGE);
    }

    assert_eq!(api.calls(), vec!["player:7".to_string()]);
}

#[tokio::test]
async fn commands_need_a_session() {
    let api = FakeApi::with_players([on_machine(player(7, "mio", Group::Beginner))]);
    let state = engine(&api);

    let err = actions::toggle_machine(&state).await.unwrap_err();
    assert!(matches!(err, ClientError::NoSession));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn rejection_message_is_shown_verbatim() {
    let api = FakeApi::with_players([player(7, "mio", Group::Beginner)]);
    let state = logged_in(&api, 7).await;
    let mut notices = state.subscribe_notices();

    api.reject_next("Please check in at the front desk first");
    let err = actions::toggle_machine(&state).await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected { code: 400, .. }));
    assert_eq!(
        notices.try_recv().unwrap().text,
        "Please check in at the front desk first"
    );
    assert!(!state.player().latest().unwrap().on_machine);
}

#[tokio::test]
async fn toggle_refreshes_the_participant() {
    let api = FakeApi::with_players([player(7, "mio", Group::Beginner)]);
    let state = logged_in(&api, 7).await;
    assert!(state.permissions().toggle_machine);

    let status = actions::toggle_machine(&state).await.unwrap();
    assert!(status.on_machine);
    assert!(state.player().latest().unwrap().on_machine);
    assert!(state.permissions().submit_score);
    assert_eq!(api.count("player:7"), 2);
}

#[tokio::test]
async fn forfeit_disables_everything_but_viewing() {
    let api = FakeApi::with_players([on_machine(player(7, "mio", Group::Beginner))]);
    let state = logged_in(&api, 7).await;

    actions::forfeit(&state).await.unwrap();
    let permissions = state.permissions();
    assert!(state.player().latest().unwrap().forfeited);
    assert!(!permissions.forfeit);
    assert!(!permissions.toggle_machine);
    assert!(!permissions.check_in);
}

fn peak_match(op_selection: Option<SongSelection>) -> MatchInfo {
    MatchInfo {
        match_id: 11,
        phase: "top4".into(),
        group: Group::Peak,
        opponent: MatchOpponent {
            name: "rin".into(),
            rating: None,
            forfeited: false,
        },
        my_selection: None,
        op_selection,
        has_banned_this_match: false,
        ban_used: false,
        was_banned: false,
    }
}

#[tokio::test]
async fn peak_song_then_ban() {
    let mut mio = player(7, "mio", Group::Peak);
    mio.promotion_status = Some(PromotionStatus::Top4Peak);
    let api = FakeApi::with_players([mio]);
    api.put_match(
        7,
        peak_match(Some(SongSelection {
            song_name: "Grievous Lady".into(),
            difficulty: 11,
            hidden: false,
        })),
    );
    let state = logged_in(&api, 7).await;
    let ticket = state.current_ticket().await.unwrap();
    snapshots::refresh_match(&state, &ticket, RefreshMode::Quiet).await;

    let permissions = state.permissions();
    assert!(permissions.submit_peak_song);
    assert!(permissions.ban_peak_song);

    let err = actions::submit_peak_song(&state, "Testify", 99)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert_eq!(api.count("submit_peak_song"), 0);

    actions::submit_peak_song(&state, " Testify ", 12).await.unwrap();
    let info = state.match_info().latest().flatten().unwrap();
    assert_eq!(info.my_selection.unwrap().song_name, "Testify");
    assert!(!state.permissions().submit_peak_song);

    actions::ban_peak_song(&state).await.unwrap();
    assert!(!state.permissions().ban_peak_song);
    assert!(matches!(
        actions::ban_peak_song(&state).await,
        Err(ClientError::NotAvailable(rejection)) if rejection.action == Action::BanPeakSong
    ));
    assert_eq!(api.count("ban_peak_song"), 1);
}

#[tokio::test]
async fn login_checks_in_and_saves_the_session() {
    let api = FakeApi::with_players([player(7, "mio", Group::Beginner)]);
    api.update_player(7, |p| p.checked_in = false);
    let state = engine(&api);

    let player = auth_service::login(&state, " mio ", PASSWORD).await.unwrap();
    assert_eq!(player.id, 7);
    assert!(player.checked_in);
    assert_eq!(api.calls(), vec!["login:mio", "check_in:mio"]);
    assert_eq!(state.session().current_identity().map(|i| i.player_id), Some(7));
}

#[tokio::test]
async fn forfeited_participant_does_not_block_another_check_in() {
    let mut mio = player(7, "mio", Group::Beginner);
    mio.forfeited = true;
    let mut rin = player(9, "rin", Group::Beginner);
    rin.checked_in = false;
    let api = FakeApi::with_players([mio, rin]);
    let state = engine(&api);
    state.session().save(7, "mio").await.unwrap();
    let ticket = state.begin_session(7).await;
    assert!(snapshots::refresh_player(&state, &ticket, RefreshMode::Quiet).await);

    let err = auth_service::check_in(&state, "mio").await.unwrap_err();
    assert!(matches!(err, ClientError::NotAvailable(_)));
    assert_eq!(api.count("check_in"), 0);

    let checked = auth_service::check_in(&state, "rin").await.unwrap();
    assert_eq!(checked.id, 9);
    assert!(checked.checked_in);
    assert_eq!(api.count("check_in:rin"), 1);
    assert_eq!(state.session().current_identity().map(|i| i.player_id), Some(9));
}

#[tokio::test]
async fn wrong_password_does_not_check_in() {
    let api = FakeApi::with_players([player(7, "mio", Group::Beginner)]);
    let state = engine(&api);
    let mut notices = state.subscribe_notices();

    let err = auth_service::login(&state, "mio", "nope").await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected { .. }));
    assert_eq!(notices.try_recv().unwrap().text, "wrong password");
    assert_eq!(api.count("check_in"), 0);
    assert_eq!(state.session().current_identity(), None);
}

#[tokio::test]
async fn empty_name_is_rejected_locally() {
    let api = FakeApi::new();
    let state = engine(&api);
    let err = auth_service::check_status(&state, "  ").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert!(matches!(state.auth_check().get(), Loadable::Error(_)));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn logout_resets_session_and_containers() {
    let api = FakeApi::with_players([player(7, "mio", Group::Beginner)]);
    let state = engine(&api);
    auth_service::login(&state, "mio", PASSWORD).await.unwrap();
    auth_service::check_status(&state, "mio").await.unwrap();

    auth_service::logout(&state).await.unwrap();
    assert_eq!(state.session().current_identity(), None);
    assert!(state.player().get().is_loading());
    assert!(state.auth_check().get().is_loading());

    auth_service::reset_auth_check(&state);
    assert_eq!(state.auth_check().latest().map(|s| s.exists), Some(false));
}

#[tokio::test]
async fn scanned_code_starts_an_auth_check() {
    let api = FakeApi::with_players([player(7, "mio", Group::Beginner)]);
    let state = engine(&api);
    let mut names = state.subscribe_scanned_names();

    let resolved = scanner::resolve_scanned_code(&state, "https://gamesign.example/p?uid=7")
        .await
        .unwrap();
    assert_eq!(resolved.map(|p| p.id), Some(7));
    assert_eq!(names.try_recv().unwrap(), "mio");
    assert_eq!(state.auth_check().latest().map(|s| s.exists), Some(true));

    let ignored = scanner::resolve_scanned_code(&state, "WIFI:S:venue;;").await.unwrap();
    assert!(ignored.is_none());
    assert_eq!(api.count("player:"), 1);
}

#[tokio::test]
async fn public_lookups() {
    let mut rin = player(9, "rin", Group::Advanced);
    rin.checked_in = false;
    let api = FakeApi::with_players([player(7, "mio", Group::Beginner), rin]);
    let state = engine(&api);

    let rankings = public_service::load_rankings(&state, Some(Group::Advanced))
        .await
        .unwrap();
    assert_eq!(rankings.len(), 1);
    assert_eq!(state.rankings().latest().unwrap()[0].name, "rin");

    let found = public_service::search_player(&state, "mio").await.unwrap();
    assert_eq!(found.id, 7);
    assert!(public_service::search_player(&state, " ").await.is_err());

    let checked_in = public_service::list_players(
        &state,
        PlayerFilter {
            group: None,
            checked_in: Some(true),
        },
    )
    .await
    .unwrap();
    assert_eq!(checked_in.iter().map(|p| p.id).collect::<Vec<_>>(), vec![7]);
}
