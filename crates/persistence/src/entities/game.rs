//! Game ledger entities (database row mappings).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::game::{GamePostSummary, GameSummary, GroupMini, ParticipationResponse};
use domain::models::UserPublic;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the games table.
#[derive(Debug, Clone, FromRow)]
pub struct GameEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub location: String,
    pub buy_in_cents: i64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<GameEntity> for domain::models::Game {
    fn from(entity: GameEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            title: entity.title,
            description: entity.description,
            date: entity.date,
            location: entity.location,
            buy_in_cents: entity.buy_in_cents,
            created_by: entity.created_by,
            created_at: entity.created_at,
        }
    }
}

/// Game row with creator, group and participation count.
#[derive(Debug, Clone, FromRow)]
pub struct GameWithDetailsEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub group_name: String,
    pub group_slug: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub location: String,
    pub buy_in_cents: i64,
    pub created_by: Uuid,
    pub creator_username: String,
    pub created_at: DateTime<Utc>,
    pub participations_count: i64,
}

impl From<GameWithDetailsEntity> for GameSummary {
    fn from(entity: GameWithDetailsEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            date: entity.date,
            location: entity.location,
            buy_in_cents: entity.buy_in_cents,
            created_by: UserPublic {
                id: entity.created_by,
                username: entity.creator_username,
            },
            created_at: entity.created_at,
            group: GroupMini {
                id: entity.group_id,
                name: entity.group_name,
                slug: entity.group_slug,
            },
            participations_count: entity.participations_count,
        }
    }
}

/// Database row mapping for the game_posts table.
#[derive(Debug, Clone, FromRow)]
pub struct GamePostEntity {
    pub id: Uuid,
    pub game_id: Uuid,
    pub group_id: Uuid,
    pub posted_by: Uuid,
    pub posted_at: DateTime<Utc>,
}

impl From<GamePostEntity> for domain::models::GamePost {
    fn from(entity: GamePostEntity) -> Self {
        Self {
            id: entity.id,
            game_id: entity.game_id,
            group_id: entity.group_id,
            posted_by: entity.posted_by,
            posted_at: entity.posted_at,
        }
    }
}

/// Post row with the game title and poster username.
#[derive(Debug, Clone, FromRow)]
pub struct GamePostWithDetailsEntity {
    pub id: Uuid,
    pub game_id: Uuid,
    pub game_title: String,
    pub group_id: Uuid,
    pub posted_by: Uuid,
    pub poster_username: String,
    pub posted_at: DateTime<Utc>,
}

impl From<GamePostWithDetailsEntity> for GamePostSummary {
    fn from(entity: GamePostWithDetailsEntity) -> Self {
        Self {
            id: entity.id,
            game: entity.game_id,
            game_title: entity.game_title,
            group: entity.group_id,
            posted_by: UserPublic {
                id: entity.posted_by,
                username: entity.poster_username,
            },
            posted_at: entity.posted_at,
        }
    }
}

/// Database row mapping for the game_participations table.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipationEntity {
    pub id: Uuid,
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub rebuy_cents: i64,
    pub final_balance_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ParticipationEntity> for domain::models::GameParticipation {
    fn from(entity: ParticipationEntity) -> Self {
        Self {
            id: entity.id,
            game_id: entity.game_id,
            player_id: entity.player_id,
            rebuy_cents: entity.rebuy_cents,
            final_balance_cents: entity.final_balance_cents,
            created_at: entity.created_at,
        }
    }
}

/// Participation row with the player's username.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipationWithPlayerEntity {
    pub id: Uuid,
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub player_username: String,
    pub rebuy_cents: i64,
    pub final_balance_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ParticipationWithPlayerEntity> for ParticipationResponse {
    fn from(entity: ParticipationWithPlayerEntity) -> Self {
        Self {
            id: entity.id,
            game: entity.game_id,
            player: UserPublic {
                id: entity.player_id,
                username: entity.player_username,
            },
            rebuy_cents: entity.rebuy_cents,
            final_balance_cents: entity.final_balance_cents,
            created_at: entity.created_at,
        }
    }
}
