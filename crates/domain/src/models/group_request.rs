//! Pending join requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::UserPublic;

/// A user's pending request to join a group. Deleted on accept or reject.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupRequest {
    pub id: Uuid,
    pub group_id: Uuid,
    pub requested_by: Uuid,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body for `POST /groups/:slug/join_request`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct JoinRequestBody {
    #[validate(length(max = 500, message = "Message must be at most 500 characters"))]
    pub message: Option<String>,
}

/// Body for `POST /group-requests`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateGroupRequestBody {
    /// Slug of the group to join.
    #[validate(length(min = 1, max = 140, message = "Group slug is required"))]
    pub group: String,

    #[validate(length(max = 500, message = "Message must be at most 500 characters"))]
    pub message: Option<String>,
}

/// Join request as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupRequestResponse {
    pub id: Uuid,
    pub group: Uuid,
    pub group_slug: String,
    pub requested_by: UserPublic,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Response after accepting a request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AcceptRequestResponse {
    pub group_id: Uuid,
    pub user_id: Uuid,
    /// False when the requester was already a member.
    pub membership_created: bool,
}
