//! Join request entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::group_request::GroupRequestResponse;
use domain::models::UserPublic;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the group_requests table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupRequestEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub requested_by: Uuid,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<GroupRequestEntity> for domain::models::GroupRequest {
    fn from(entity: GroupRequestEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            requested_by: entity.requested_by,
            message: entity.message,
            created_at: entity.created_at,
        }
    }
}

/// Join request joined with its group slug and requester username.
#[derive(Debug, Clone, FromRow)]
pub struct GroupRequestWithDetailsEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub group_slug: String,
    pub requested_by: Uuid,
    pub requester_username: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<GroupRequestWithDetailsEntity> for GroupRequestResponse {
    fn from(entity: GroupRequestWithDetailsEntity) -> Self {
        Self {
            id: entity.id,
            group: entity.group_id,
            group_slug: entity.group_slug,
            requested_by: UserPublic {
                id: entity.requested_by,
                username: entity.requester_username,
            },
            message: entity.message,
            created_at: entity.created_at,
        }
    }
}
