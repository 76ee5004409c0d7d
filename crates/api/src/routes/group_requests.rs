//! Join request routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::group_request::{
    AcceptRequestResponse, CreateGroupRequestBody, GroupRequestResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::MembershipService;

fn service(state: &AppState) -> MembershipService {
    MembershipService::new(state.pool.clone())
}

/// Requests the caller filed and requests to groups they administer.
///
/// GET /api/v1/group-requests
pub async fn list_requests(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<Vec<GroupRequestResponse>>, ApiError> {
    let requests = service(&state).list_requests(user_auth.user_id).await?;
    Ok(Json(requests))
}

/// Ask to join the group named by `group` (a slug).
///
/// POST /api/v1/group-requests
pub async fn create_request(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(body): Json<CreateGroupRequestBody>,
) -> Result<(StatusCode, Json<GroupRequestResponse>), ApiError> {
    body.validate()?;

    let request = service(&state)
        .request_join(user_auth.user_id, &body.group, body.message.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/v1/group-requests/:id
pub async fn get_request(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupRequestResponse>, ApiError> {
    let request = service(&state).get_request(user_auth.user_id, id).await?;
    Ok(Json(request))
}

/// Reject (admin) or withdraw (requester) a request.
///
/// DELETE /api/v1/group-requests/:id
pub async fn reject_request(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    service(&state)
        .reject_request(user_auth.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/group-requests/:id/accept
pub async fn accept_request(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<AcceptRequestResponse>, ApiError> {
    let response = service(&state)
        .accept_request(user_auth.user_id, id)
        .await?;
    Ok(Json(response))
}
