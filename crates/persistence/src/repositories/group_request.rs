//! Join request persistence.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{GroupRequestEntity, GroupRequestWithDetailsEntity};
use crate::metrics::QueryTimer;

/// Repository for pending join requests.
#[derive(Clone)]
pub struct GroupRequestRepository {
    pool: PgPool,
}

impl GroupRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a request unless one is already pending for (group, user).
    ///
    /// Returns `None` on the duplicate.
    pub async fn create_request(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        message: Option<&str>,
    ) -> Result<Option<GroupRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_group_request");
        let result = sqlx::query_as::<_, GroupRequestEntity>(
            r#"
            INSERT INTO group_requests (group_id, requested_by, message)
            VALUES ($1, $2, $3)
            ON CONFLICT (group_id, requested_by) DO NOTHING
            RETURNING id, group_id, requested_by, message, created_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(message)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GroupRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_group_request_by_id");
        let result = sqlx::query_as::<_, GroupRequestEntity>(
            r#"
            SELECT id, group_id, requested_by, message, created_at
            FROM group_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Request with its group slug and requester username.
    pub async fn find_with_details(
        &self,
        id: Uuid,
    ) -> Result<Option<GroupRequestWithDetailsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_group_request_with_details");
        let result = sqlx::query_as::<_, GroupRequestWithDetailsEntity>(
            r#"
            SELECT r.id, r.group_id, g.slug AS group_slug, r.requested_by,
                   u.username AS requester_username, r.message, r.created_at
            FROM group_requests r
            JOIN groups g ON g.id = r.group_id
            JOIN users u ON u.id = r.requested_by
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Requests a user may see: their own, plus those for groups they
    /// created or administer. Newest first.
    pub async fn list_visible_to(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<GroupRequestWithDetailsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_visible_group_requests");
        let result = sqlx::query_as::<_, GroupRequestWithDetailsEntity>(
            r#"
            SELECT r.id, r.group_id, g.slug AS group_slug, r.requested_by,
                   u.username AS requester_username, r.message, r.created_at
            FROM group_requests r
            JOIN groups g ON g.id = r.group_id
            JOIN users u ON u.id = r.requested_by
            WHERE r.requested_by = $1
               OR g.created_by = $1
               OR EXISTS (
                    SELECT 1 FROM group_memberships gm
                    WHERE gm.group_id = r.group_id
                      AND gm.user_id = $1
                      AND gm.role IN ('owner', 'admin')
               )
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Load and row-lock a request so concurrent accepts serialize.
    pub async fn lock_request(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<GroupRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_group_request");
        let result = sqlx::query_as::<_, GroupRequestEntity>(
            r#"
            SELECT id, group_id, requested_by, message, created_at
            FROM group_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    pub async fn delete_request(conn: &mut PgConnection, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_group_request");
        let result = sqlx::query("DELETE FROM group_requests WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
