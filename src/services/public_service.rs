//! Read-only lookups that need no session.

use crate::{
    dto::{
        player::{Group, Player, PlayerFilter},
        ranking::RankingItem,
    },
    error::ClientError,
    state::{SharedState, loadable::Loadable},
};

/// Load the leaderboard, optionally for one group, into the rankings container.
pub async fn load_rankings(
    state: &SharedState,
    group: Option<Group>,
) -> Result<Vec<RankingItem>, ClientError> {
    state.rankings().replace(Loadable::Loading);
    let result = state.api().rankings(group).await.map_err(ClientError::from);
    match &result {
        Ok(items) => {
            state.rankings().replace(Loadable::Success(items.clone()));
        }
        Err(err) => {
            state.rankings().replace(Loadable::Error(err.user_message()));
        }
    }
    result
}

/// Find a participant by exact name.
pub async fn search_player(state: &SharedState, name: &str) -> Result<Player, ClientError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClientError::InvalidInput("name must not be empty".into()));
    }
    Ok(state.api().search_player(name.to_string()).await?)
}

/// List participants matching `filter`.
pub async fn list_players(
    state: &SharedState,
    filter: PlayerFilter,
) -> Result<Vec<Player>, ClientError> {
    Ok(state.api().list_players(filter).await?)
}
