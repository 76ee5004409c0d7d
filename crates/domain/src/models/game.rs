//! Game ledger domain models: games, posts and participations.
//!
//! Money amounts are integer cents.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::UserPublic;

/// A poker game owned by a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Game {
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub location: String,
    pub buy_in_cents: i64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Link between a game and a group it was posted to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GamePost {
    pub id: Uuid,
    pub game_id: Uuid,
    pub group_id: Uuid,
    pub posted_by: Uuid,
    pub posted_at: DateTime<Utc>,
}

/// One player's result in one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GameParticipation {
    pub id: Uuid,
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub rebuy_cents: i64,
    pub final_balance_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Request payload for posting a game to a group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateGameRequest {
    /// Slug of the group the game is posted to.
    #[validate(length(min = 1, max = 140, message = "Group slug is required"))]
    pub group: String,

    #[validate(length(max = 140, message = "Title must be at most 140 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    /// Defaults to today.
    pub date: Option<NaiveDate>,

    #[validate(length(max = 180, message = "Location must be at most 180 characters"))]
    pub location: Option<String>,

    #[validate(custom(function = "shared::validation::validate_amount_cents"))]
    pub buy_in_cents: i64,
}

/// Request payload for updating a game. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateGameRequest {
    #[validate(length(max = 140, message = "Title must be at most 140 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub date: Option<NaiveDate>,

    #[validate(length(max = 180, message = "Location must be at most 180 characters"))]
    pub location: Option<String>,

    #[validate(custom(function = "shared::validation::validate_amount_cents"))]
    pub buy_in_cents: Option<i64>,
}

/// Query parameters for listing games.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListGamesQuery {
    /// Restrict to one group, by slug.
    pub group: Option<String>,
}

/// Body for `POST /games/:id/add_participation`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ParticipationInput {
    #[validate(required(message = "player_id is required"))]
    pub player_id: Option<Uuid>,

    #[validate(custom(function = "shared::validation::validate_amount_cents"))]
    pub rebuy_cents: Option<i64>,

    #[validate(required(message = "final_balance_cents is required"))]
    #[validate(custom(function = "shared::validation::validate_amount_cents"))]
    pub final_balance_cents: Option<i64>,
}

/// Body for `POST /participations`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateParticipationRequest {
    #[validate(required(message = "game is required"))]
    pub game: Option<Uuid>,

    #[serde(flatten)]
    #[validate(nested)]
    pub values: ParticipationInput,
}

/// Body for `POST /games/:id/remove_participation`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RemoveParticipationRequest {
    #[validate(required(message = "player_id is required"))]
    pub player_id: Option<Uuid>,
}

/// Request payload for updating a participation. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateParticipationRequest {
    #[validate(custom(function = "shared::validation::validate_amount_cents"))]
    pub rebuy_cents: Option<i64>,

    #[validate(custom(function = "shared::validation::validate_amount_cents"))]
    pub final_balance_cents: Option<i64>,
}

/// Query parameters for listing participations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListParticipationsQuery {
    pub game: Option<Uuid>,
}

/// Minimal group reference embedded in game responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupMini {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Game entry in listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GameSummary {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub location: String,
    pub buy_in_cents: i64,
    pub created_by: UserPublic,
    pub created_at: DateTime<Utc>,
    pub group: GroupMini,
    pub participations_count: i64,
}

/// Participation as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ParticipationResponse {
    pub id: Uuid,
    pub game: Uuid,
    pub player: UserPublic,
    pub rebuy_cents: i64,
    pub final_balance_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Game with its participations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GameDetail {
    #[serde(flatten)]
    pub summary: GameSummary,
    pub description: String,
    pub participations: Vec<ParticipationResponse>,
}

/// Post entry shown on the group page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GamePostSummary {
    pub id: Uuid,
    pub game: Uuid,
    pub game_title: String,
    pub group: Uuid,
    pub posted_by: UserPublic,
    pub posted_at: DateTime<Utc>,
}

/// Response after removing a participation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RemoveParticipationResponse {
    pub removed: bool,
    pub game_id: Uuid,
    pub player_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_game_request_rejects_negative_buy_in() {
        let req: CreateGameRequest = serde_json::from_value(json!({
            "group": "friday-night",
            "buy_in_cents": -100
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_game_request_minimal() {
        let req: CreateGameRequest = serde_json::from_value(json!({
            "group": "friday-night",
            "buy_in_cents": 5000
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.date.is_none());
        assert!(req.title.is_none());
    }

    #[test]
    fn test_participation_input_requires_player() {
        let req: ParticipationInput = serde_json::from_value(json!({
            "final_balance_cents": 8000
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_participation_input_rejects_negative_amounts() {
        let req: ParticipationInput = serde_json::from_value(json!({
            "player_id": Uuid::new_v4(),
            "rebuy_cents": -1,
            "final_balance_cents": 8000
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: ParticipationInput = serde_json::from_value(json!({
            "player_id": Uuid::new_v4(),
            "final_balance_cents": -5
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_participation_input_valid() {
        let req: ParticipationInput = serde_json::from_value(json!({
            "player_id": Uuid::new_v4(),
            "final_balance_cents": 2000
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.rebuy_cents.is_none());
    }

    #[test]
    fn test_create_participation_request_flattens_values() {
        let game = Uuid::new_v4();
        let req: CreateParticipationRequest = serde_json::from_value(json!({
            "game": game,
            "player_id": Uuid::new_v4(),
            "rebuy_cents": 0,
            "final_balance_cents": 100
        }))
        .unwrap();
        assert_eq!(req.game, Some(game));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_game_request_validation() {
        let req = UpdateGameRequest {
            buy_in_cents: Some(-1),
            ..Default::default()
        };
        assert!(req.validate().is_err());
        assert!(UpdateGameRequest::default().validate().is_ok());
    }
}
