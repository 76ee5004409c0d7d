//! Participation routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::game::{
    CreateParticipationRequest, ListParticipationsQuery, ParticipationResponse,
    UpdateParticipationRequest,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::routes::games::ledger;

/// GET /api/v1/participations
pub async fn list_participations(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<ListParticipationsQuery>,
) -> Result<Json<Vec<ParticipationResponse>>, ApiError> {
    let participations = ledger(&state)
        .list_participations(user_auth.user_id, query.game)
        .await?;
    Ok(Json(participations))
}

/// Same upsert as `add_participation`, with the game in the body.
///
/// POST /api/v1/participations
pub async fn create_participation(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateParticipationRequest>,
) -> Result<(StatusCode, Json<ParticipationResponse>), ApiError> {
    request.validate()?;
    let game_id = request
        .game
        .ok_or_else(|| ApiError::Validation("game is required".to_string()))?;

    let participation = ledger(&state)
        .upsert_participation(user_auth.user_id, game_id, &request.values)
        .await?;
    Ok((StatusCode::CREATED, Json(participation)))
}

/// GET /api/v1/participations/:id
pub async fn get_participation(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ParticipationResponse>, ApiError> {
    let participation = ledger(&state)
        .get_participation(user_auth.user_id, id)
        .await?;
    Ok(Json(participation))
}

/// PUT /api/v1/participations/:id
pub async fn update_participation(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateParticipationRequest>,
) -> Result<Json<ParticipationResponse>, ApiError> {
    request.validate()?;

    let participation = ledger(&state)
        .update_participation(user_auth.user_id, id, &request)
        .await?;
    Ok(Json(participation))
}

/// DELETE /api/v1/participations/:id
pub async fn delete_participation(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ledger(&state)
        .delete_participation(user_auth.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
