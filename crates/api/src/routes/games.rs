//! Game routes and the per-game participation actions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::game::{
    CreateGameRequest, GameDetail, GameSummary, ListGamesQuery, ParticipationInput,
    ParticipationResponse, RemoveParticipationRequest, RemoveParticipationResponse,
    UpdateGameRequest,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::LedgerService;

pub(crate) fn ledger(state: &AppState) -> LedgerService {
    LedgerService::new(state.pool.clone())
}

/// Games of the caller's groups, newest first. `?group=<slug>` narrows to
/// one group.
///
/// GET /api/v1/games
pub async fn list_games(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<ListGamesQuery>,
) -> Result<Json<Vec<GameSummary>>, ApiError> {
    let games = ledger(&state)
        .list_games(user_auth.user_id, query.group.as_deref())
        .await?;
    Ok(Json(games))
}

/// Create a game and post it to a group.
///
/// POST /api/v1/games
pub async fn create_game(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameDetail>), ApiError> {
    request.validate()?;

    let game = ledger(&state)
        .post_game(user_auth.user_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// GET /api/v1/games/:id
pub async fn get_game(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<GameDetail>, ApiError> {
    let game = ledger(&state).get_game(user_auth.user_id, id).await?;
    Ok(Json(game))
}

/// PUT /api/v1/games/:id
pub async fn update_game(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGameRequest>,
) -> Result<Json<GameDetail>, ApiError> {
    request.validate()?;

    let game = ledger(&state)
        .update_game(user_auth.user_id, id, &request)
        .await?;
    Ok(Json(game))
}

/// Deletes the game with its posts and participations.
///
/// DELETE /api/v1/games/:id
pub async fn delete_game(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ledger(&state).delete_game(user_auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a player's result; a second call for the same player overwrites.
///
/// POST /api/v1/games/:id/add_participation
pub async fn add_participation(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(id): Path<Uuid>,
    Json(input): Json<ParticipationInput>,
) -> Result<Json<ParticipationResponse>, ApiError> {
    input.validate()?;

    let participation = ledger(&state)
        .upsert_participation(user_auth.user_id, id, &input)
        .await?;
    Ok(Json(participation))
}

/// POST /api/v1/games/:id/remove_participation
pub async fn remove_participation(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<RemoveParticipationRequest>,
) -> Result<Json<RemoveParticipationResponse>, ApiError> {
    request.validate()?;
    let player_id = request
        .player_id
        .ok_or_else(|| ApiError::Validation("player_id is required".to_string()))?;

    let response = ledger(&state)
        .remove_participation(user_auth.user_id, id, player_id)
        .await?;
    Ok(Json(response))
}
