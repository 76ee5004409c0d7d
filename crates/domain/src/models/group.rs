//! Group domain models: groups, memberships and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::models::game::{GamePostSummary, GameSummary};
use crate::models::user::UserPublic;

/// Maximum slug length stored for a group.
pub const SLUG_MAX_LEN: usize = 140;

/// Role within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Owner,
    Admin,
    Member,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Owner => "owner",
            GroupRole::Admin => "admin",
            GroupRole::Member => "member",
        }
    }

    /// Returns true for roles that administer the group (OWNER, ADMIN).
    pub fn is_admin_tier(&self) -> bool {
        matches!(self, GroupRole::Owner | GroupRole::Admin)
    }
}

impl FromStr for GroupRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(GroupRole::Owner),
            "admin" => Ok(GroupRole::Admin),
            "member" => Ok(GroupRole::Member),
            _ => Err(format!("Invalid group role: {}", s)),
        }
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A group that games are posted to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A user's membership in a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupMembership {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

/// Request payload for creating a group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateGroupRequest {
    #[validate(length(
        min = 1,
        max = 120,
        message = "Name must be between 1 and 120 characters"
    ))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Request payload for updating a group. The slug never changes.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateGroupRequest {
    #[validate(length(
        min = 1,
        max = 120,
        message = "Name must be between 1 and 120 characters"
    ))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Query parameters for listing groups.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListGroupsQuery {
    /// Case-insensitive substring matched against name and description.
    pub search: Option<String>,
}

/// Group entry in listings, with activity aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_by: UserPublic,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
    pub post_count: i64,
    pub last_post: Option<DateTime<Utc>>,
}

/// Groups split by the caller's relation to them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListGroupsResponse {
    pub my_groups: Vec<GroupSummary>,
    pub pending_groups: Vec<GroupSummary>,
    pub other_groups: Vec<GroupSummary>,
}

/// Member entry in the group detail roster.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MemberResponse {
    pub id: Uuid,
    pub user: UserPublic,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

/// Response for group detail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupDetail {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_by: UserPublic,
    pub created_at: DateTime<Utc>,
    pub memberships: Vec<MemberResponse>,
    pub is_member: bool,
    pub is_admin: bool,
    pub is_creator: bool,
    pub recent_posts: Vec<GamePostSummary>,
    pub recent_games: Vec<GameSummary>,
}

/// Response after a promote or demote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RoleChangeResponse {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: GroupRole,
}

/// Response when removing a member.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RemoveMemberResponse {
    pub removed: bool,
    pub user_id: Uuid,
    pub group_id: Uuid,
}

/// Response after leaving a group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LeaveGroupResponse {
    /// One of `left`, `ownership_transferred`, `group_deleted`.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_creator_id: Option<Uuid>,
}

/// Helper function to generate URL-safe slug from name.
pub fn generate_slug(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                ' ' // Will be filtered out
            }
        })
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        return "group".to_string();
    }
    truncate_chars(&slug, SLUG_MAX_LEN - 8)
}

/// Slug to try for the given attempt: the base first, then `base-2`, `base-3`, ...
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

/// First candidate in the `base`, `base-2`, `base-3`, ... sequence not in `taken`.
pub fn first_free_slug(base: &str, taken: &[String]) -> String {
    (1..)
        .map(|attempt| slug_candidate(base, attempt))
        .find(|candidate| !taken.iter().any(|t| t == candidate))
        .unwrap_or_else(|| base.to_string())
}

fn truncate_chars(s: &str, max: usize) -> String {
    let truncated: String = s.chars().take(max).collect();
    truncated.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_role_as_str() {
        assert_eq!(GroupRole::Owner.as_str(), "owner");
        assert_eq!(GroupRole::Admin.as_str(), "admin");
        assert_eq!(GroupRole::Member.as_str(), "member");
    }

    #[test]
    fn test_group_role_from_str() {
        assert_eq!(GroupRole::from_str("OWNER").unwrap(), GroupRole::Owner);
        assert_eq!(GroupRole::from_str("Admin").unwrap(), GroupRole::Admin);
        assert_eq!(GroupRole::from_str("member").unwrap(), GroupRole::Member);
        assert!(GroupRole::from_str("viewer").is_err());
    }

    #[test]
    fn test_group_role_admin_tier() {
        assert!(GroupRole::Owner.is_admin_tier());
        assert!(GroupRole::Admin.is_admin_tier());
        assert!(!GroupRole::Member.is_admin_tier());
    }

    #[test]
    fn test_group_role_serialization() {
        assert_eq!(serde_json::to_string(&GroupRole::Admin).unwrap(), "\"admin\"");
        let role: GroupRole = serde_json::from_str("\"member\"").unwrap();
        assert_eq!(role, GroupRole::Member);
    }

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Friday Night"), "friday-night");
        assert_eq!(generate_slug("  Home  Game  "), "home-game");
        assert_eq!(generate_slug("Texas_Hold'em!!"), "texas-holdem");
        assert_eq!(generate_slug("A--B"), "a-b");
    }

    #[test]
    fn test_generate_slug_keeps_unicode_letters() {
        assert_eq!(generate_slug("Pôquer São Paulo"), "pôquer-são-paulo");
    }

    #[test]
    fn test_generate_slug_falls_back_when_empty() {
        assert_eq!(generate_slug("!!!"), "group");
        assert_eq!(generate_slug(""), "group");
    }

    #[test]
    fn test_generate_slug_leaves_room_for_suffix() {
        let slug = generate_slug(&"x".repeat(300));
        assert!(slug.chars().count() <= SLUG_MAX_LEN - 8);
        assert!(slug_candidate(&slug, 999).chars().count() <= SLUG_MAX_LEN);
    }

    #[test]
    fn test_slug_candidate_sequence() {
        assert_eq!(slug_candidate("friday-night", 1), "friday-night");
        assert_eq!(slug_candidate("friday-night", 2), "friday-night-2");
        assert_eq!(slug_candidate("friday-night", 3), "friday-night-3");
    }

    #[test]
    fn test_first_free_slug() {
        assert_eq!(first_free_slug("friday-night", &[]), "friday-night");

        let taken = vec!["friday-night".to_string()];
        assert_eq!(first_free_slug("friday-night", &taken), "friday-night-2");

        let taken = vec![
            "friday-night".to_string(),
            "friday-night-2".to_string(),
            "friday-night-4".to_string(),
        ];
        assert_eq!(first_free_slug("friday-night", &taken), "friday-night-3");
    }

    #[test]
    fn test_first_free_slug_ignores_unrelated_prefix_matches() {
        let taken = vec!["friday-night-poker".to_string()];
        assert_eq!(first_free_slug("friday-night", &taken), "friday-night");
    }

    #[test]
    fn test_create_group_request_validation() {
        let ok = CreateGroupRequest {
            name: "Friday Night".to_string(),
            description: None,
        };
        assert!(ok.validate().is_ok());

        let blank = CreateGroupRequest {
            name: "   ".to_string(),
            description: None,
        };
        assert!(blank.validate().is_err());

        let long = CreateGroupRequest {
            name: "n".repeat(121),
            description: None,
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_update_group_request_allows_partial() {
        let req: UpdateGroupRequest =
            serde_json::from_str(r#"{"description":"Weekly cash game"}"#).unwrap();
        assert!(req.name.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_leave_response_omits_missing_creator() {
        let json = serde_json::to_value(LeaveGroupResponse {
            outcome: "left",
            new_creator_id: None,
        })
        .unwrap();
        assert_eq!(json["outcome"], "left");
        assert!(json.get("new_creator_id").is_none());
    }
}
