//! Outbound request bodies, validated before they leave the client.

use serde::Serialize;
use validator::Validate;

use crate::state::promotion::ScorePhase;

/// Highest chart difficulty accepted for a peak song selection.
pub const MAX_DIFFICULTY: u32 = 20;

/// Body for `auth/check_status` and `player/checkin`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct NameRequest {
    /// Participant name.
    #[validate(length(min = 1, max = 64, message = "name must not be empty"))]
    pub name: String,
}

/// Body for `auth/login`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    /// Participant name.
    #[validate(length(min = 1, max = 64, message = "name must not be empty"))]
    pub name: String,
    /// Plain password, sent over the configured transport.
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

/// Multipart fields for `auth/register`.
#[derive(Debug, Clone, Validate)]
pub struct RegisterRequest {
    /// Participant name.
    #[validate(length(min = 1, max = 64, message = "name must not be empty"))]
    pub name: String,
    /// Password to set.
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
    /// Optional avatar image.
    pub avatar: Option<AvatarUpload>,
}

/// Image uploaded together with a registration.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    /// File name reported to the service.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

/// Body for `player/{id}/submit_score`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct SubmitScoreRequest {
    /// Achieved score.
    #[validate(range(min = 0.0, message = "score must not be negative"))]
    pub score: f64,
    /// Phase the score counts for.
    pub phase: ScorePhase,
}

/// Body for `player/{id}/peak/submit_song`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct SubmitPeakSongRequest {
    /// Song title.
    #[validate(length(min = 1, message = "song name must not be empty"))]
    pub song_name: String,
    /// Chart difficulty.
    #[validate(range(min = 1, max = 20, message = "difficulty out of range"))]
    pub difficulty: u32,
}

/// Body for `player/{id}/redeem_card`.
#[derive(Debug, Clone, Serialize)]
pub struct RedeemCardRequest {
    /// Card type read from the contactless card.
    pub card_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_request_serializes_phase_in_snake_case() {
        let body = SubmitScoreRequest {
            score: 0.9512,
            phase: ScorePhase::Revival,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["phase"], "revival");
        assert_eq!(json["score"], 0.9512);
    }

    #[test]
    fn rejects_invalid_inputs() {
        assert!(
            SubmitScoreRequest {
                score: -1.0,
                phase: ScorePhase::Round1
            }
            .validate()
            .is_err()
        );
        assert!(
            SubmitPeakSongRequest {
                song_name: String::new(),
                difficulty: 12
            }
            .validate()
            .is_err()
        );
        assert!(
            SubmitPeakSongRequest {
                song_name: "Axium Crisis".into(),
                difficulty: MAX_DIFFICULTY + 1
            }
            .validate()
            .is_err()
        );
        assert!(
            NameRequest {
                name: "kana".into()
            }
            .validate()
            .is_ok()
        );
    }
}
