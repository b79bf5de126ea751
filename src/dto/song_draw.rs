use serde::Deserialize;

use crate::dto::player::Group;

/// Progress of the global song draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawStatus {
    /// Songs are being drawn right now.
    Rolling,
    /// The draw is over and `selected_songs` is final.
    Finished,
    /// No draw in progress; unknown statuses read as idle.
    #[default]
    #[serde(other)]
    Idle,
}

/// A song known to the tournament service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Song {
    /// Song identifier.
    pub id: u32,
    /// Song title.
    pub name: String,
    /// Jacket image location.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Global song draw snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SongDrawState {
    /// Current draw status.
    pub status: DrawStatus,
    /// Phase being drawn for.
    #[serde(default)]
    pub phase: Option<String>,
    /// Division being drawn for; `None` for public draws.
    #[serde(default)]
    pub group: Option<Group>,
    /// Localized phase label.
    #[serde(default)]
    pub phase_label: Option<String>,
    /// Localized division label.
    #[serde(default)]
    pub group_label: Option<String>,
    /// Candidate songs.
    #[serde(default)]
    pub songs: Vec<Song>,
    /// Songs selected once the draw finished.
    #[serde(default)]
    pub selected_songs: Vec<Song>,
}

impl SongDrawState {
    /// Whether the draw is still rolling.
    pub fn is_rolling(&self) -> bool {
        self.status == DrawStatus::Rolling
    }

    /// Draws are shown to their own division only; ungrouped draws are public.
    ///
    /// A draw for a division this client does not know is shown to nobody.
    pub fn is_visible_to(&self, viewer: Group) -> bool {
        match self.group {
            None => true,
            Some(Group::Other) => false,
            Some(group) => group == viewer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_server_payload_without_candidates() {
        let draw: SongDrawState = serde_json::from_str(
            r#"{"status":"finished","phase":"top8","group":"advanced",
                "selected_songs":[{"id":2,"name":"Tempestissimo","image_url":null}]}"#,
        )
        .unwrap();

        assert_eq!(draw.status, DrawStatus::Finished);
        assert!(draw.songs.is_empty());
        assert_eq!(draw.selected_songs.len(), 1);
    }

    #[test]
    fn visibility_follows_group() {
        let public = SongDrawState::default();
        assert!(public.is_visible_to(Group::Peak));

        let advanced = SongDrawState {
            group: Some(Group::Advanced),
            ..SongDrawState::default()
        };
        assert!(advanced.is_visible_to(Group::Advanced));
        assert!(!advanced.is_visible_to(Group::Beginner));
    }

    #[test]
    fn unknown_division_draw_is_hidden() {
        let draw: SongDrawState =
            serde_json::from_str(r#"{"status":"rolling","group":"masters"}"#).unwrap();
        assert!(draw.is_rolling());
        assert_eq!(draw.group, Some(Group::Other));
        for viewer in [Group::Beginner, Group::Advanced, Group::Peak, Group::Other] {
            assert!(!draw.is_visible_to(viewer));
        }
    }

    #[test]
    fn unknown_status_reads_as_idle() {
        let draw: SongDrawState = serde_json::from_str(r#"{"status":"paused"}"#).unwrap();
        assert_eq!(draw.status, DrawStatus::Idle);
    }
}
