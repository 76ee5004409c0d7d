//! Game and game post persistence.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{GameEntity, GamePostEntity, GamePostWithDetailsEntity, GameWithDetailsEntity};
use crate::metrics::QueryTimer;

const GAME_DETAILS_SELECT: &str = r#"
    SELECT g.id, g.group_id, gr.name AS group_name, gr.slug AS group_slug,
           g.title, g.description, g.date, g.location, g.buy_in_cents,
           g.created_by, u.username AS creator_username, g.created_at,
           (SELECT COUNT(*) FROM game_participations p WHERE p.game_id = g.id) AS participations_count
    FROM games g
    JOIN groups gr ON gr.id = g.group_id
    JOIN users u ON u.id = g.created_by
"#;

/// Fields for a new game row.
#[derive(Debug, Clone)]
pub struct NewGame<'a> {
    pub group_id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub date: NaiveDate,
    pub location: &'a str,
    pub buy_in_cents: i64,
    pub created_by: Uuid,
}

/// Partial game update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct GameChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub date: Option<NaiveDate>,
    pub location: Option<&'a str>,
    pub buy_in_cents: Option<i64>,
}

/// Repository for games and their posts.
#[derive(Clone)]
pub struct GameRepository {
    pool: PgPool,
}

impl GameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert_game(
        conn: &mut PgConnection,
        game: &NewGame<'_>,
    ) -> Result<GameEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_game");
        let result = sqlx::query_as::<_, GameEntity>(
            r#"
            INSERT INTO games (group_id, title, description, date, location, buy_in_cents, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, group_id, title, description, date, location, buy_in_cents, created_by, created_at
            "#,
        )
        .bind(game.group_id)
        .bind(game.title)
        .bind(game.description)
        .bind(game.date)
        .bind(game.location)
        .bind(game.buy_in_cents)
        .bind(game.created_by)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Get-or-create the post of a game to a group.
    pub async fn ensure_post(
        conn: &mut PgConnection,
        game_id: Uuid,
        group_id: Uuid,
        posted_by: Uuid,
    ) -> Result<GamePostEntity, sqlx::Error> {
        let timer = QueryTimer::new("ensure_game_post");
        sqlx::query(
            r#"
            INSERT INTO game_posts (game_id, group_id, posted_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (game_id, group_id) DO NOTHING
            "#,
        )
        .bind(game_id)
        .bind(group_id)
        .bind(posted_by)
        .execute(&mut *conn)
        .await?;

        let result = sqlx::query_as::<_, GamePostEntity>(
            r#"
            SELECT id, game_id, group_id, posted_by, posted_at
            FROM game_posts
            WHERE game_id = $1 AND group_id = $2
            "#,
        )
        .bind(game_id)
        .bind(group_id)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Number of posts of a game.
    pub async fn count_posts(&self, game_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_game_posts");
        let result =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM game_posts WHERE game_id = $1")
                .bind(game_id)
                .fetch_one(&self.pool)
                .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GameEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_game_by_id");
        let result = sqlx::query_as::<_, GameEntity>(
            r#"
            SELECT id, group_id, title, description, date, location, buy_in_cents, created_by, created_at
            FROM games
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Game with group, creator and participation count.
    pub async fn find_with_details(
        &self,
        id: Uuid,
    ) -> Result<Option<GameWithDetailsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_game_with_details");
        let sql = format!("{} WHERE g.id = $1", GAME_DETAILS_SELECT);
        let result = sqlx::query_as::<_, GameWithDetailsEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Games of every group the user belongs to, newest date first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        group_slug: Option<&str>,
    ) -> Result<Vec<GameWithDetailsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_games_for_user");
        let sql = format!(
            r#"{}
            WHERE EXISTS (
                SELECT 1 FROM group_memberships gm
                WHERE gm.group_id = g.group_id AND gm.user_id = $1
            )
              AND ($2::text IS NULL OR gr.slug = $2)
            ORDER BY g.date DESC, g.created_at DESC
            "#,
            GAME_DETAILS_SELECT
        );
        let result = sqlx::query_as::<_, GameWithDetailsEntity>(&sql)
            .bind(user_id)
            .bind(group_slug)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Most recent games of a group.
    pub async fn recent_for_group(
        &self,
        group_id: Uuid,
        limit: i64,
    ) -> Result<Vec<GameWithDetailsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("recent_games_for_group");
        let sql = format!(
            "{} WHERE g.group_id = $1 ORDER BY g.date DESC, g.created_at DESC LIMIT $2",
            GAME_DETAILS_SELECT
        );
        let result = sqlx::query_as::<_, GameWithDetailsEntity>(&sql)
            .bind(group_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Most recent posts to a group.
    pub async fn recent_posts_for_group(
        &self,
        group_id: Uuid,
        limit: i64,
    ) -> Result<Vec<GamePostWithDetailsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("recent_posts_for_group");
        let result = sqlx::query_as::<_, GamePostWithDetailsEntity>(
            r#"
            SELECT gp.id, gp.game_id, g.title AS game_title, gp.group_id,
                   gp.posted_by, u.username AS poster_username, gp.posted_at
            FROM game_posts gp
            JOIN games g ON g.id = gp.game_id
            JOIN users u ON u.id = gp.posted_by
            WHERE gp.group_id = $1
            ORDER BY gp.posted_at DESC
            LIMIT $2
            "#,
        )
        .bind(group_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update_game(
        &self,
        game_id: Uuid,
        changes: &GameChanges<'_>,
    ) -> Result<Option<GameEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_game");
        let result = sqlx::query_as::<_, GameEntity>(
            r#"
            UPDATE games
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                date = COALESCE($4, date),
                location = COALESCE($5, location),
                buy_in_cents = COALESCE($6, buy_in_cents)
            WHERE id = $1
            RETURNING id, group_id, title, description, date, location, buy_in_cents, created_by, created_at
            "#,
        )
        .bind(game_id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.date)
        .bind(changes.location)
        .bind(changes.buy_in_cents)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete_posts(conn: &mut PgConnection, game_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_game_posts");
        let result = sqlx::query("DELETE FROM game_posts WHERE game_id = $1")
            .bind(game_id)
            .execute(&mut *conn)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    pub async fn delete_game(conn: &mut PgConnection, game_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_game");
        let result = sqlx::query("DELETE FROM games WHERE id = $1")
            .bind(game_id)
            .execute(&mut *conn)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
