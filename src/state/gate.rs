//! Action permissions derived from the latest snapshots.

use std::fmt;

use thiserror::Error;

use crate::{
    dto::{match_info::MatchInfo, player::{Group, Player}},
    state::promotion,
};

/// Participant commands guarded by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Check in on site.
    CheckIn,
    /// Take or leave a competition station.
    ToggleMachine,
    /// Submit a qualifying or revival score.
    SubmitScore,
    /// Withdraw from the tournament.
    Forfeit,
    /// Choose the song for a peak match.
    SubmitPeakSong,
    /// Ban the opponent's peak song.
    BanPeakSong,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::CheckIn => "check-in",
            Action::ToggleMachine => "toggle-machine",
            Action::SubmitScore => "submit-score",
            Action::Forfeit => "forfeit",
            Action::SubmitPeakSong => "submit-peak-song",
            Action::BanPeakSong => "ban-peak-song",
        };
        f.write_str(name)
    }
}

/// Local refusal of a command; no request was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{action} is not currently available")]
pub struct GateRejection {
    /// The refused command.
    pub action: Action,
}

/// Snapshot of every permission, for enabling and disabling affordances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    /// Check-in allowed.
    pub check_in: bool,
    /// Station toggle allowed.
    pub toggle_machine: bool,
    /// Score submission allowed.
    pub submit_score: bool,
    /// Forfeit allowed.
    pub forfeit: bool,
    /// Peak song submission allowed.
    pub submit_peak_song: bool,
    /// Peak ban allowed.
    pub ban_peak_song: bool,
    /// The station button should be shown (it may still be disabled).
    pub show_machine_button: bool,
}

impl Permissions {
    /// Derive all permissions from the latest known snapshots.
    ///
    /// Without a participant snapshot only check-in is possible.
    pub fn derive(player: Option<&Player>, match_info: Option<&MatchInfo>) -> Self {
        let Some(player) = player else {
            return Self {
                check_in: true,
                ..Self::default()
            };
        };

        Self {
            check_in: promotion::can_check_in(player),
            toggle_machine: promotion::can_toggle_machine(player),
            submit_score: promotion::can_submit_score(player),
            forfeit: promotion::can_forfeit(player),
            submit_peak_song: can_submit_peak_song(player, match_info),
            ban_peak_song: can_ban_peak_song(player, match_info),
            show_machine_button: promotion::should_show_machine_button(player),
        }
    }

    /// Whether `action` is permitted.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::CheckIn => self.check_in,
            Action::ToggleMachine => self.toggle_machine,
            Action::SubmitScore => self.submit_score,
            Action::Forfeit => self.forfeit,
            Action::SubmitPeakSong => self.submit_peak_song,
            Action::BanPeakSong => self.ban_peak_song,
        }
    }
}

/// Re-validate `action` against the snapshots right before dispatch.
pub fn authorize(
    action: Action,
    player: Option<&Player>,
    match_info: Option<&MatchInfo>,
) -> Result<(), GateRejection> {
    if Permissions::derive(player, match_info).allows(action) {
        Ok(())
    } else {
        Err(GateRejection { action })
    }
}

fn can_submit_peak_song(player: &Player, match_info: Option<&MatchInfo>) -> bool {
    let Some(info) = match_info else {
        return false;
    };

    player.group == Group::Peak
        && !player.forfeited
        && player
            .promotion_status
            .is_some_and(|status| status.is_peak_selection_stage())
        && info.my_selection.is_none()
}

fn can_ban_peak_song(player: &Player, match_info: Option<&MatchInfo>) -> bool {
    let Some(info) = match_info else {
        return false;
    };

    player.group == Group::Peak
        && !player.forfeited
        && info.revealed_opponent_selection().is_some()
        && !info.ban_used
        && !info.has_banned_this_match
}
