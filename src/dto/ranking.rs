use serde::Deserialize;

use crate::dto::player::Group;

/// One row of the public leaderboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankingItem {
    /// 1-based position.
    pub rank: u32,
    /// Participant name.
    pub name: String,
    /// Division.
    pub group: Group,
    /// Localized division label.
    #[serde(default)]
    pub group_label: Option<String>,
    /// Bracket match number, if assigned.
    #[serde(default)]
    pub match_number: Option<u32>,
    /// Best score for the ranking phase.
    #[serde(default)]
    pub score: Option<f64>,
    /// Free-form status text.
    #[serde(default)]
    pub status: Option<String>,
    /// Participant withdrew.
    #[serde(default)]
    pub forfeited: bool,
}
