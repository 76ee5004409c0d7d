//! Game participation persistence.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{ParticipationEntity, ParticipationWithPlayerEntity};
use crate::metrics::QueryTimer;

/// Repository for per-player game results.
#[derive(Clone)]
pub struct ParticipationRepository {
    pool: PgPool,
}

impl ParticipationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or overwrite the (game, player) row. Values replace, never add.
    pub async fn upsert(
        &self,
        game_id: Uuid,
        player_id: Uuid,
        rebuy_cents: i64,
        final_balance_cents: i64,
    ) -> Result<ParticipationEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_participation");
        let result = sqlx::query_as::<_, ParticipationEntity>(
            r#"
            INSERT INTO game_participations (game_id, player_id, rebuy_cents, final_balance_cents)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (game_id, player_id) DO UPDATE
            SET rebuy_cents = EXCLUDED.rebuy_cents,
                final_balance_cents = EXCLUDED.final_balance_cents
            RETURNING id, game_id, player_id, rebuy_cents, final_balance_cents, created_at
            "#,
        )
        .bind(game_id)
        .bind(player_id)
        .bind(rebuy_cents)
        .bind(final_balance_cents)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Remove a player's row from a game. Returns the number of rows deleted.
    pub async fn remove(&self, game_id: Uuid, player_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("remove_participation");
        let result =
            sqlx::query("DELETE FROM game_participations WHERE game_id = $1 AND player_id = $2")
                .bind(game_id)
                .bind(player_id)
                .execute(&self.pool)
                .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ParticipationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_participation_by_id");
        let result = sqlx::query_as::<_, ParticipationEntity>(
            r#"
            SELECT id, game_id, player_id, rebuy_cents, final_balance_cents, created_at
            FROM game_participations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_with_player(
        &self,
        id: Uuid,
    ) -> Result<Option<ParticipationWithPlayerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_participation_with_player");
        let result = sqlx::query_as::<_, ParticipationWithPlayerEntity>(
            r#"
            SELECT p.id, p.game_id, p.player_id, u.username AS player_username,
                   p.rebuy_cents, p.final_balance_cents, p.created_at
            FROM game_participations p
            JOIN users u ON u.id = p.player_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Rows of one game, by player username.
    pub async fn list_for_game(
        &self,
        game_id: Uuid,
    ) -> Result<Vec<ParticipationWithPlayerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_participations_for_game");
        let result = sqlx::query_as::<_, ParticipationWithPlayerEntity>(
            r#"
            SELECT p.id, p.game_id, p.player_id, u.username AS player_username,
                   p.rebuy_cents, p.final_balance_cents, p.created_at
            FROM game_participations p
            JOIN users u ON u.id = p.player_id
            WHERE p.game_id = $1
            ORDER BY u.username
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Rows of games in groups the user belongs to, newest first.
    pub async fn list_for_user_groups(
        &self,
        user_id: Uuid,
        game_id: Option<Uuid>,
    ) -> Result<Vec<ParticipationWithPlayerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_participations_for_user");
        let result = sqlx::query_as::<_, ParticipationWithPlayerEntity>(
            r#"
            SELECT p.id, p.game_id, p.player_id, u.username AS player_username,
                   p.rebuy_cents, p.final_balance_cents, p.created_at
            FROM game_participations p
            JOIN users u ON u.id = p.player_id
            JOIN games g ON g.id = p.game_id
            WHERE EXISTS (
                SELECT 1 FROM group_memberships gm
                WHERE gm.group_id = g.group_id AND gm.user_id = $1
            )
              AND ($2::uuid IS NULL OR p.game_id = $2)
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(game_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: Uuid,
        rebuy_cents: Option<i64>,
        final_balance_cents: Option<i64>,
    ) -> Result<Option<ParticipationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_participation");
        let result = sqlx::query_as::<_, ParticipationEntity>(
            r#"
            UPDATE game_participations
            SET rebuy_cents = COALESCE($2, rebuy_cents),
                final_balance_cents = COALESCE($3, final_balance_cents)
            WHERE id = $1
            RETURNING id, game_id, player_id, rebuy_cents, final_balance_cents, created_at
            "#,
        )
        .bind(id)
        .bind(rebuy_cents)
        .bind(final_balance_cents)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_participation");
        let result = sqlx::query("DELETE FROM game_participations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Delete every row of a game inside an open transaction.
    pub async fn delete_for_game(
        conn: &mut PgConnection,
        game_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_participations_for_game");
        let result = sqlx::query("DELETE FROM game_participations WHERE game_id = $1")
            .bind(game_id)
            .execute(&mut *conn)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
