//! Promotion status values, their classification, and the permission
//! predicates derived from a participant snapshot.
//!
//! Every decision here is a pure function of a [`Player`]: there are no
//! client-side counters, so the gate and any other caller always agree.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::dto::player::Player;

/// Server-assigned bracket stage or outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromotionStatus {
    /// Round of sixteen.
    Top16,
    /// Quarter finals.
    Top8,
    /// Semi finals.
    Top4,
    /// Peak division semi finals.
    Top4Peak,
    /// Final match.
    Final,
    /// Tournament winner.
    Champion,
    /// Second place.
    RunnerUp,
    /// Third place.
    Third,
    /// Fourth place.
    Fourth,
    /// Out after qualifying.
    Eliminated,
    /// Lost in the round of sixteen.
    Top16Out,
    /// Lost in the quarter finals.
    Top8Out,
    /// Playing the secondary qualification phase.
    Revival,
    /// Disqualified for missing the check-in deadline.
    TimeoutEliminated,
    /// Value this client does not know; treated as deny-all.
    Unrecognized,
}

impl PromotionStatus {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            PromotionStatus::Top16 => "top16",
            PromotionStatus::Top8 => "top8",
            PromotionStatus::Top4 => "top4",
            PromotionStatus::Top4Peak => "top4_peak",
            PromotionStatus::Final => "final",
            PromotionStatus::Champion => "champion",
            PromotionStatus::RunnerUp => "runner_up",
            PromotionStatus::Third => "third",
            PromotionStatus::Fourth => "fourth",
            PromotionStatus::Eliminated => "eliminated",
            PromotionStatus::Top16Out => "top16_out",
            PromotionStatus::Top8Out => "top8_out",
            PromotionStatus::Revival => "revival",
            PromotionStatus::TimeoutEliminated => "timeout_eliminated",
            PromotionStatus::Unrecognized => "unrecognized",
        }
    }

    /// Still in the bracket, or finished with a placement.
    pub fn is_promoted(self) -> bool {
        matches!(
            self,
            PromotionStatus::Top16
                | PromotionStatus::Top8
                | PromotionStatus::Top4
                | PromotionStatus::Top4Peak
                | PromotionStatus::Final
                | PromotionStatus::Champion
                | PromotionStatus::RunnerUp
                | PromotionStatus::Third
                | PromotionStatus::Fourth
        )
    }

    /// Knocked out of the competition.
    pub fn is_eliminated(self) -> bool {
        matches!(
            self,
            PromotionStatus::Eliminated
                | PromotionStatus::Top16Out
                | PromotionStatus::Top8Out
                | PromotionStatus::TimeoutEliminated
        )
    }

    /// Head-to-head bracket play, where direct score submission does not apply.
    pub fn is_advanced_stage(self) -> bool {
        matches!(
            self,
            PromotionStatus::Top16
                | PromotionStatus::Top8
                | PromotionStatus::Top4
                | PromotionStatus::Top4Peak
                | PromotionStatus::Final
                | PromotionStatus::Top16Out
                | PromotionStatus::Top8Out
                | PromotionStatus::Champion
                | PromotionStatus::RunnerUp
                | PromotionStatus::Third
                | PromotionStatus::Fourth
        )
    }

    /// Final standings; the bracket is over for this participant.
    pub fn is_final_placement(self) -> bool {
        matches!(
            self,
            PromotionStatus::Champion
                | PromotionStatus::RunnerUp
                | PromotionStatus::Third
                | PromotionStatus::Fourth
        )
    }

    /// Peak-division stages where participants pick their own song.
    pub fn is_peak_selection_stage(self) -> bool {
        matches!(self, PromotionStatus::Top4Peak | PromotionStatus::Final)
    }
}

impl fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by [`PromotionStatus::from_str`] for unknown values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown promotion status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for PromotionStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let status = match value {
            "top16" => PromotionStatus::Top16,
            "top8" => PromotionStatus::Top8,
            "top4" => PromotionStatus::Top4,
            "top4_peak" => PromotionStatus::Top4Peak,
            "final" => PromotionStatus::Final,
            "champion" => PromotionStatus::Champion,
            "runner_up" => PromotionStatus::RunnerUp,
            "third" => PromotionStatus::Third,
            "fourth" => PromotionStatus::Fourth,
            "eliminated" => PromotionStatus::Eliminated,
            "top16_out" => PromotionStatus::Top16Out,
            "top8_out" => PromotionStatus::Top8Out,
            "revival" => PromotionStatus::Revival,
            "timeout_eliminated" => PromotionStatus::TimeoutEliminated,
            other => return Err(UnknownStatus(other.to_string())),
        };
        Ok(status)
    }
}

/// Decode `promotion_status`, mapping `null`, missing and `""` to unset.
pub(crate) fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<PromotionStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let status = raw
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value.parse().unwrap_or_else(|err: UnknownStatus| {
                debug!(error = %err, "treating promotion status as unrecognized");
                PromotionStatus::Unrecognized
            })
        });
    Ok(status)
}

/// Phase a submitted score counts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorePhase {
    /// Qualifying round.
    Round1,
    /// Revival round.
    Revival,
}

/// Phase a score submission must carry, resolved from the status alone.
pub fn score_phase(player: &Player) -> ScorePhase {
    match player.promotion_status {
        Some(PromotionStatus::Revival) => ScorePhase::Revival,
        _ => ScorePhase::Round1,
    }
}

/// Whether the participant may submit a score right now.
pub fn can_submit_score(player: &Player) -> bool {
    if !player.on_machine {
        return false;
    }

    match player.promotion_status {
        None => player.score_round1.is_none(),
        Some(PromotionStatus::Revival) => player.score_revival.is_none(),
        Some(status) if status.is_advanced_stage() => false,
        // eliminated, timeout_eliminated and unknown values
        Some(_) => false,
    }
}

/// Whether the participant may withdraw.
pub fn can_forfeit(player: &Player) -> bool {
    if player.forfeited {
        return false;
    }

    !matches!(
        player.promotion_status,
        Some(
            PromotionStatus::Eliminated
                | PromotionStatus::Top8Out
                | PromotionStatus::Top16Out
                | PromotionStatus::Champion
                | PromotionStatus::RunnerUp
                | PromotionStatus::Third
                | PromotionStatus::Fourth
                | PromotionStatus::TimeoutEliminated
                | PromotionStatus::Unrecognized
        )
    )
}

/// Whether the participant may take or leave a competition station.
pub fn can_toggle_machine(player: &Player) -> bool {
    if player.forfeited {
        return false;
    }

    match player.promotion_status {
        Some(PromotionStatus::Unrecognized) => false,
        Some(status) => !status.is_eliminated(),
        None => true,
    }
}

/// Whether the station button should be offered at all.
pub fn should_show_machine_button(player: &Player) -> bool {
    let revival_pending = player.promotion_status == Some(PromotionStatus::Revival)
        && player.score_revival.is_none();
    let advanced = player
        .promotion_status
        .is_some_and(PromotionStatus::is_advanced_stage);

    player.score_round1.is_none() || revival_pending || advanced
}

/// Whether a head-to-head pairing can exist for this participant.
pub fn may_have_active_match(player: &Player) -> bool {
    !player.forfeited
        && player
            .promotion_status
            .is_some_and(|status| status.is_promoted() && !status.is_final_placement())
}

/// Whether check-in is still meaningful for this participant.
pub fn can_check_in(player: &Player) -> bool {
    !player.forfeited
        && !player
            .promotion_status
            .is_some_and(|status| status.is_eliminated() || status == PromotionStatus::Unrecognized)
}
