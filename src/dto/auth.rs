use serde::Deserialize;

/// Registration status for a participant name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthStatus {
    /// The name is on the participant list.
    pub exists: bool,
    /// A password has been set for this name.
    pub registered: bool,
    /// Avatar uploaded at registration.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Outcome of a login or registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginOutcome {
    /// Credentials were accepted.
    pub success: bool,
    /// Message from the service.
    #[serde(default)]
    pub msg: String,
}

/// Station occupancy after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MachineStatus {
    /// Participant is now on a station.
    pub on_machine: bool,
}
