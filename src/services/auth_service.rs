//! Login, registration, check-in and logout flows.

use tracing::{info, warn};
use validator::Validate;

use crate::{
    dto::{
        auth::{AuthStatus, LoginOutcome},
        player::Player,
        requests::{LoginRequest, NameRequest, RegisterRequest},
    },
    error::ClientError,
    services::actions::dispatch,
    state::{
        NoticeKind, SharedState,
        gate::{self, Action},
        loadable::Loadable,
    },
};

/// Code attached to a refused login, mirroring the service's HTTP status.
const LOGIN_REFUSED_CODE: i32 = 401;

/// Look up whether `name` exists and has a password, publishing into the
/// auth check container.
pub async fn check_status(state: &SharedState, name: &str) -> Result<AuthStatus, ClientError> {
    state.auth_check().replace(Loadable::Loading);

    let request = NameRequest {
        name: name.trim().to_string(),
    };
    let result = match request.validate() {
        Ok(()) => state
            .api()
            .check_status(request.name)
            .await
            .map_err(ClientError::from),
        Err(err) => Err(err.into()),
    };

    match &result {
        Ok(status) => {
            state.auth_check().replace(Loadable::Success(status.clone()));
        }
        Err(err) => {
            state
                .auth_check()
                .replace(Loadable::Error(err.user_message()));
        }
    }
    result
}

/// Forget the last auth check.
pub fn reset_auth_check(state: &SharedState) {
    state
        .auth_check()
        .replace(Loadable::Success(AuthStatus::default()));
}

/// Log in with a password, then check in under the same name.
pub async fn login(state: &SharedState, name: &str, password: &str) -> Result<Player, ClientError> {
    let request = LoginRequest {
        name: name.trim().to_string(),
        password: password.to_string(),
    };
    validate(state, &request)?;

    let name = request.name.clone();
    let outcome = dispatch(state, state.api().login(request).await)?;
    accepted(state, outcome)?;
    check_in(state, &name).await
}

/// Register a password (and optional avatar), then check in.
pub async fn register(state: &SharedState, mut request: RegisterRequest) -> Result<Player, ClientError> {
    request.name = request.name.trim().to_string();
    validate(state, &request)?;

    let name = request.name.clone();
    let outcome = dispatch(state, state.api().register(request).await)?;
    accepted(state, outcome)?;
    check_in(state, &name).await
}

/// Check in by name and make the participant the session identity.
///
/// The local gate only applies to the participant already logged in; the
/// snapshot says nothing about anyone else.
pub async fn check_in(state: &SharedState, name: &str) -> Result<Player, ClientError> {
    let name = name.trim();
    let own = state
        .session()
        .current_identity()
        .is_some_and(|identity| identity.name == name);
    let current = state
        .player()
        .latest()
        .filter(|player| own && player.name == name);
    if let Err(rejection) = gate::authorize(Action::CheckIn, current.as_ref(), None) {
        let err = ClientError::from(rejection);
        state.notify_error(&err);
        return Err(err);
    }

    let request = NameRequest {
        name: name.to_string(),
    };
    validate(state, &request)?;

    let ack = dispatch(state, state.api().check_in(request.name).await)?;
    let player = ack.data;
    if let Err(err) = state.session().save(player.id, &player.name).await {
        warn!(player_id = player.id, error = %err, "failed to persist session");
        let err = ClientError::from(err);
        state.notify_error(&err);
        return Err(err);
    }
    info!(player_id = player.id, "checked in");

    // the supervisor may not have opened the session yet; its first fetch covers that case
    if let Some(ticket) = state
        .current_ticket()
        .await
        .filter(|ticket| ticket.player_id == player.id)
    {
        state.publish_player(&ticket, Ok(player.clone())).await;
    }
    state.notify(
        NoticeKind::Success,
        ack.message.unwrap_or_else(|| "checked in".into()),
    );
    Ok(player)
}

/// Clear the session, which stops the sync loop, and reset the containers.
pub async fn logout(state: &SharedState) -> Result<(), ClientError> {
    state.session().clear().await?;
    state.end_session().await;
    state.auth_check().replace(Loadable::Loading);
    info!("logged out");
    Ok(())
}

fn validate(state: &SharedState, request: &impl Validate) -> Result<(), ClientError> {
    request.validate().map_err(|err| {
        let err = ClientError::from(err);
        state.notify_error(&err);
        err
    })
}

fn accepted(state: &SharedState, outcome: LoginOutcome) -> Result<(), ClientError> {
    if outcome.success {
        return Ok(());
    }
    let err = ClientError::Rejected {
        code: LOGIN_REFUSED_CODE,
        message: Some(outcome.msg).filter(|msg| !msg.is_empty()),
    };
    state.notify_error(&err);
    Err(err)
}
