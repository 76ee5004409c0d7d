//! Group entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::group::{GroupRole, GroupSummary, MemberResponse};
use domain::models::UserPublic;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for group_role that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "group_role", rename_all = "lowercase")]
pub enum GroupRoleDb {
    Owner,
    Admin,
    Member,
}

impl From<GroupRoleDb> for GroupRole {
    fn from(db_role: GroupRoleDb) -> Self {
        match db_role {
            GroupRoleDb::Owner => GroupRole::Owner,
            GroupRoleDb::Admin => GroupRole::Admin,
            GroupRoleDb::Member => GroupRole::Member,
        }
    }
}

impl From<GroupRole> for GroupRoleDb {
    fn from(role: GroupRole) -> Self {
        match role {
            GroupRole::Owner => GroupRoleDb::Owner,
            GroupRole::Admin => GroupRoleDb::Admin,
            GroupRole::Member => GroupRoleDb::Member,
        }
    }
}

/// Database row mapping for the groups table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<GroupEntity> for domain::models::Group {
    fn from(entity: GroupEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            slug: entity.slug,
            description: entity.description,
            created_by: entity.created_by,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the group_memberships table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMembershipEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: GroupRoleDb,
    pub joined_at: DateTime<Utc>,
}

impl From<GroupMembershipEntity> for domain::models::GroupMembership {
    fn from(entity: GroupMembershipEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            user_id: entity.user_id,
            role: entity.role.into(),
            joined_at: entity.joined_at,
        }
    }
}

/// Caller's relation to a listed group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRelation {
    Member,
    Pending,
    Other,
}

impl GroupRelation {
    fn from_column(value: &str) -> Self {
        match value {
            "member" => GroupRelation::Member,
            "pending" => GroupRelation::Pending,
            _ => GroupRelation::Other,
        }
    }
}

/// Group row with creator, activity aggregates and the caller's relation.
#[derive(Debug, Clone, FromRow)]
pub struct GroupListingEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_by: Uuid,
    pub creator_username: String,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
    pub post_count: i64,
    pub last_post: Option<DateTime<Utc>>,
    /// `member`, `pending` or `other`
    pub relation: String,
}

impl GroupListingEntity {
    pub fn relation(&self) -> GroupRelation {
        GroupRelation::from_column(&self.relation)
    }
}

impl From<GroupListingEntity> for GroupSummary {
    fn from(entity: GroupListingEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            slug: entity.slug,
            description: entity.description,
            created_by: UserPublic {
                id: entity.created_by,
                username: entity.creator_username,
            },
            created_at: entity.created_at,
            member_count: entity.member_count,
            post_count: entity.post_count,
            last_post: entity.last_post,
        }
    }
}

/// Membership row joined with the member's username.
#[derive(Debug, Clone, FromRow)]
pub struct MemberWithUserEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub role: GroupRoleDb,
    pub joined_at: DateTime<Utc>,
}

impl From<MemberWithUserEntity> for MemberResponse {
    fn from(entity: MemberWithUserEntity) -> Self {
        Self {
            id: entity.id,
            user: UserPublic {
                id: entity.user_id,
                username: entity.username,
            },
            role: entity.role.into(),
            joined_at: entity.joined_at,
        }
    }
}
