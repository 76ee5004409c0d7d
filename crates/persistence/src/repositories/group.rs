//! Group and membership persistence.
//!
//! Associated functions taking `&mut PgConnection` are steps of a larger unit
//! of work; the caller owns the transaction.

use domain::models::group::GroupRole;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{
    GroupEntity, GroupListingEntity, GroupMembershipEntity, GroupRoleDb, MemberWithUserEntity,
};
use crate::metrics::QueryTimer;

/// Name of the unique constraint on `groups.slug`.
pub const GROUP_SLUG_CONSTRAINT: &str = "groups_slug_key";

/// Repository for group-related database operations.
#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Creates a new GroupRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Slugs already taken by `base` or any `base-N`.
    pub async fn taken_slugs(
        conn: &mut PgConnection,
        base: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        let timer = QueryTimer::new("find_taken_slugs");
        let result = sqlx::query_scalar::<_, String>(
            r#"
            SELECT slug FROM groups
            WHERE slug = $1 OR slug LIKE $1 || '-%'
            "#,
        )
        .bind(base)
        .fetch_all(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Insert a group row.
    pub async fn insert_group(
        conn: &mut PgConnection,
        name: &str,
        slug: &str,
        description: &str,
        created_by: Uuid,
    ) -> Result<GroupEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_group");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            INSERT INTO groups (name, slug, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, slug, description, created_by, created_at
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(created_by)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Add a membership unless one exists. Returns true when a row was inserted.
    pub async fn add_member(
        conn: &mut PgConnection,
        group_id: Uuid,
        user_id: Uuid,
        role: GroupRole,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("add_group_member");
        let result = sqlx::query(
            r#"
            INSERT INTO group_memberships (group_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (group_id, user_id) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(GroupRoleDb::from(role))
        .execute(&mut *conn)
        .await?;
        timer.record();
        Ok(result.rows_affected() == 1)
    }

    /// Find a group by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_group_by_id");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            SELECT id, name, slug, description, created_by, created_at
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a group by slug.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_group_by_slug");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            SELECT id, name, slug, description, created_by, created_at
            FROM groups
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Load and row-lock a group for the rest of the transaction.
    ///
    /// Membership changes on the same group serialize on this lock.
    pub async fn lock_group(
        conn: &mut PgConnection,
        group_id: Uuid,
    ) -> Result<Option<GroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_group");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            SELECT id, name, slug, description, created_by, created_at
            FROM groups
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(group_id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Groups with aggregates and the caller's relation, ordered by name.
    ///
    /// `search` is matched case-insensitively against name and description.
    pub async fn list_groups_for_user(
        &self,
        user_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<GroupListingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_groups_for_user");
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let result = sqlx::query_as::<_, GroupListingEntity>(
            r#"
            SELECT
                g.id, g.name, g.slug, g.description, g.created_by,
                u.username AS creator_username, g.created_at,
                (SELECT COUNT(*) FROM group_memberships gm WHERE gm.group_id = g.id) AS member_count,
                (SELECT COUNT(*) FROM game_posts gp WHERE gp.group_id = g.id) AS post_count,
                (SELECT MAX(gp.posted_at) FROM game_posts gp WHERE gp.group_id = g.id) AS last_post,
                CASE
                    WHEN EXISTS (
                        SELECT 1 FROM group_memberships gm
                        WHERE gm.group_id = g.id AND gm.user_id = $1
                    ) THEN 'member'
                    WHEN EXISTS (
                        SELECT 1 FROM group_requests gr
                        WHERE gr.group_id = g.id AND gr.requested_by = $1
                    ) THEN 'pending'
                    ELSE 'other'
                END AS relation
            FROM groups g
            JOIN users u ON u.id = g.created_by
            WHERE $2::text IS NULL OR g.name ILIKE $2 OR g.description ILIKE $2
            ORDER BY g.name
            "#,
        )
        .bind(user_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update name and/or description. The slug is never touched.
    pub async fn update_group(
        &self,
        group_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<GroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_group");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            UPDATE groups
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, slug, description, created_by, created_at
            "#,
        )
        .bind(group_id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a group; memberships, requests, invites, games, posts and
    /// participations go with it.
    pub async fn delete_group(conn: &mut PgConnection, group_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_group");
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(group_id)
            .execute(&mut *conn)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Hand the group to a new creator.
    pub async fn set_creator(
        conn: &mut PgConnection,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("set_group_creator");
        sqlx::query("UPDATE groups SET created_by = $2 WHERE id = $1")
            .bind(group_id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        timer.record();
        Ok(())
    }

    /// Get a user's membership in a group.
    pub async fn get_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMembershipEntity>, sqlx::Error> {
        let timer = QueryTimer::new("get_group_membership");
        let result = sqlx::query_as::<_, GroupMembershipEntity>(
            r#"
            SELECT id, group_id, user_id, role, joined_at
            FROM group_memberships
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All memberships of a group, earliest joined first.
    pub async fn list_memberships(
        conn: &mut PgConnection,
        group_id: Uuid,
    ) -> Result<Vec<GroupMembershipEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_group_memberships");
        let result = sqlx::query_as::<_, GroupMembershipEntity>(
            r#"
            SELECT id, group_id, user_id, role, joined_at
            FROM group_memberships
            WHERE group_id = $1
            ORDER BY joined_at, user_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Set a member's role. `None` when the user has no membership.
    pub async fn update_member_role(
        conn: &mut PgConnection,
        group_id: Uuid,
        user_id: Uuid,
        role: GroupRole,
    ) -> Result<Option<GroupMembershipEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_member_role");
        let result = sqlx::query_as::<_, GroupMembershipEntity>(
            r#"
            UPDATE group_memberships
            SET role = $3
            WHERE group_id = $1 AND user_id = $2
            RETURNING id, group_id, user_id, role, joined_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(GroupRoleDb::from(role))
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Remove a member from a group. Returns the number of rows deleted.
    pub async fn remove_member(
        conn: &mut PgConnection,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("remove_group_member");
        let result = sqlx::query(
            r#"
            DELETE FROM group_memberships
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Roster with usernames, earliest joined first.
    pub async fn list_members(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<MemberWithUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_group_members");
        let result = sqlx::query_as::<_, MemberWithUserEntity>(
            r#"
            SELECT gm.id, gm.user_id, u.username, gm.role, gm.joined_at
            FROM group_memberships gm
            JOIN users u ON u.id = gm.user_id
            WHERE gm.group_id = $1
            ORDER BY gm.joined_at, gm.user_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

/// Wraps a search term for ILIKE, escaping its wildcards.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_term() {
        assert_eq!(like_pattern("friday"), "%friday%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
