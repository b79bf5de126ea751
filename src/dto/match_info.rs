use serde::Deserialize;

use crate::dto::player::Group;

/// Head-to-head pairing the participant is currently assigned to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchInfo {
    /// Service-side match identifier.
    pub match_id: u32,
    /// Bracket phase label (e.g. `top8`).
    pub phase: String,
    /// Division the match belongs to.
    pub group: Group,
    /// The other participant in this pairing.
    pub opponent: MatchOpponent,
    /// Own song choice, cleared when the opponent bans it.
    #[serde(default)]
    pub my_selection: Option<SongSelection>,
    /// Opponent song choice, possibly hidden until everyone has chosen.
    #[serde(default)]
    pub op_selection: Option<SongSelection>,
    /// The participant already banned the opponent's song in this match.
    #[serde(default)]
    pub has_banned_this_match: bool,
    /// The one-time ban skill has been spent.
    #[serde(default)]
    pub ban_used: bool,
    /// The participant's own selection was banned by the opponent.
    #[serde(default)]
    pub was_banned: bool,
}

/// Opponent summary inside a [`MatchInfo`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchOpponent {
    /// Opponent display name.
    pub name: String,
    /// Opponent rating when known.
    #[serde(default)]
    pub rating: Option<i32>,
    /// The opponent withdrew.
    #[serde(default)]
    pub forfeited: bool,
}

/// A song chosen for a peak-division match.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongSelection {
    /// Song title.
    pub song_name: String,
    /// Chart difficulty level.
    #[serde(default)]
    pub difficulty: u32,
    /// Submitted but not revealed yet.
    #[serde(default)]
    pub hidden: bool,
}

impl MatchInfo {
    /// Opponent selection that has been revealed, if any.
    pub fn revealed_opponent_selection(&self) -> Option<&SongSelection> {
        self.op_selection.as_ref().filter(|selection| !selection.hidden)
    }
}
