//! Group routes: listing, CRUD and the membership sub-actions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::group::{
    CreateGroupRequest, GroupDetail, LeaveGroupResponse, ListGroupsQuery, ListGroupsResponse,
    RemoveMemberResponse, RoleChangeResponse, UpdateGroupRequest,
};
use domain::models::group_request::{GroupRequestResponse, JoinRequestBody};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::MembershipService;

fn service(state: &AppState) -> MembershipService {
    MembershipService::new(state.pool.clone())
}

/// List all groups, bucketed by the caller's relation to each.
///
/// GET /api/v1/groups
pub async fn list_groups(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<ListGroupsQuery>,
) -> Result<Json<ListGroupsResponse>, ApiError> {
    let response = service(&state)
        .list_groups(user_auth.user_id, query.search.as_deref())
        .await?;

    tracing::debug!(
        user_id = %user_auth.user_id,
        mine = response.my_groups.len(),
        pending = response.pending_groups.len(),
        other = response.other_groups.len(),
        "Listed groups"
    );
    Ok(Json(response))
}

/// Create a group. The caller becomes its creator and OWNER.
///
/// POST /api/v1/groups
pub async fn create_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupDetail>), ApiError> {
    request.validate()?;

    let service = service(&state);
    let group = service.create_group(user_auth.user_id, &request).await?;
    let detail = service.get_group(user_auth.user_id, &group.slug).await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/v1/groups/:slug
pub async fn get_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(slug): Path<String>,
) -> Result<Json<GroupDetail>, ApiError> {
    let detail = service(&state).get_group(user_auth.user_id, &slug).await?;
    Ok(Json(detail))
}

/// PUT /api/v1/groups/:slug
pub async fn update_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(slug): Path<String>,
    Json(request): Json<UpdateGroupRequest>,
) -> Result<Json<GroupDetail>, ApiError> {
    request.validate()?;

    let service = service(&state);
    let group = service
        .update_group(user_auth.user_id, &slug, &request)
        .await?;
    let detail = service.get_group(user_auth.user_id, &group.slug).await?;
    Ok(Json(detail))
}

/// DELETE /api/v1/groups/:slug
pub async fn delete_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    service(&state)
        .delete_group(user_auth.user_id, &slug)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ask to join a group. The body and its message are optional.
///
/// POST /api/v1/groups/:slug/join_request
pub async fn join_request(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(slug): Path<String>,
    body: Option<Json<JoinRequestBody>>,
) -> Result<(StatusCode, Json<GroupRequestResponse>), ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()?;

    let request = service(&state)
        .request_join(user_auth.user_id, &slug, body.message.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// POST /api/v1/groups/:slug/promote/:user_id
pub async fn promote(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((slug, target)): Path<(String, Uuid)>,
) -> Result<Json<RoleChangeResponse>, ApiError> {
    let response = service(&state)
        .promote(user_auth.user_id, &slug, target)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/groups/:slug/demote/:user_id
pub async fn demote(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((slug, target)): Path<(String, Uuid)>,
) -> Result<Json<RoleChangeResponse>, ApiError> {
    let response = service(&state)
        .demote(user_auth.user_id, &slug, target)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/groups/:slug/remove/:user_id
pub async fn remove_member(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((slug, target)): Path<(String, Uuid)>,
) -> Result<Json<RemoveMemberResponse>, ApiError> {
    let response = service(&state)
        .remove_member(user_auth.user_id, &slug, target)
        .await?;
    Ok(Json(response))
}

/// Leave a group. A leaving creator hands over ownership or, when alone,
/// deletes the group.
///
/// POST /api/v1/groups/:slug/leave
pub async fn leave(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(slug): Path<String>,
) -> Result<Json<LeaveGroupResponse>, ApiError> {
    let outcome = service(&state).leave(user_auth.user_id, &slug).await?;
    Ok(Json(LeaveGroupResponse {
        outcome: outcome.as_str(),
        new_creator_id: outcome.new_creator(),
    }))
}
