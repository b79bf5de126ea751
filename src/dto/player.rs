use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::promotion::{self, PromotionStatus};

/// Competition division a participant plays in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    /// Entry level division.
    #[default]
    Beginner,
    /// Advanced division.
    Advanced,
    /// Peak division: best-of-one matches with song selection and bans.
    Peak,
    /// A division name this client does not know.
    #[serde(other)]
    Other,
}

impl Group {
    /// Wire representation used in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Group::Beginner => "beginner",
            Group::Advanced => "advanced",
            Group::Peak => "peak",
            Group::Other => "other",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative participant snapshot owned by the tournament service.
///
/// Snapshots are replaced wholesale on every fetch; the client never edits
/// one in place.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Player {
    /// Numeric participant identifier.
    pub id: u32,
    /// Display name, also used as the login name.
    pub name: String,
    /// Division the participant plays in.
    pub group: Group,
    /// Localized division label chosen by the service.
    #[serde(default)]
    pub group_label: Option<String>,
    /// Bracket match number; may be reassigned by the service.
    #[serde(default)]
    pub match_number: Option<u32>,
    /// Participant has checked in on site.
    #[serde(default)]
    pub checked_in: bool,
    /// Participant currently occupies a competition station.
    #[serde(default)]
    pub on_machine: bool,
    /// Current bracket stage or outcome, unset during qualifying.
    #[serde(default, deserialize_with = "promotion::deserialize_status")]
    pub promotion_status: Option<PromotionStatus>,
    /// Optional skill rating.
    #[serde(default)]
    pub rating: Option<i32>,
    /// Qualifying score, present once submitted.
    #[serde(default)]
    pub score_round1: Option<f64>,
    /// Revival score, present once submitted.
    #[serde(default)]
    pub score_revival: Option<f64>,
    /// Participant withdrew voluntarily.
    #[serde(default)]
    pub forfeited: bool,
    /// The one-time ban skill has been spent.
    #[serde(default)]
    pub ban_used: bool,
    /// The organizers have opened the competition for this participant.
    #[serde(default)]
    pub match_started: bool,
    /// Avatar location relative to the service root.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Filter for the participant listing route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerFilter {
    /// Restrict to one division.
    pub group: Option<Group>,
    /// Restrict to checked-in (or not checked-in) participants.
    pub checked_in: Option<bool>,
}
