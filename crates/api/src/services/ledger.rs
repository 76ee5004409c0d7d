//! Game ledger: games posted to groups and per-player results.
//!
//! Games and participations of a group the caller does not belong to are
//! reported as missing. Members who lack the rights for a write get
//! `Forbidden`.

use chrono::Utc;
use domain::models::game::{
    CreateGameRequest, GameDetail, GameSummary, ParticipationInput, ParticipationResponse,
    RemoveParticipationResponse, UpdateGameRequest, UpdateParticipationRequest,
};
use domain::models::{Game, GameParticipation, Group, GroupMembership};
use domain::services::{
    is_game_creator_or_group_creator, is_member, is_self_or_game_creator, GameAccess,
    GroupAccess, ParticipationAccess,
};
use domain::DomainError;
use persistence::repositories::{
    GameChanges, GameRepository, GroupRepository, NewGame, ParticipationRepository,
    UserRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::middleware::metrics::record_action;
use crate::services::{ensure, hide, ServiceError, ServiceResult};

const GAME_WRITE_DENIED: &str = "Only the game creator or the group creator can do this";

pub struct LedgerService {
    pool: PgPool,
    games: GameRepository,
    groups: GroupRepository,
    participations: ParticipationRepository,
    users: UserRepository,
}

impl LedgerService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            games: GameRepository::new(pool.clone()),
            groups: GroupRepository::new(pool.clone()),
            participations: ParticipationRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }

    async fn group_access(&self, group: &Group, actor: Uuid) -> ServiceResult<GroupAccess> {
        let membership: Option<GroupMembership> = self
            .groups
            .get_membership(group.id, actor)
            .await?
            .map(Into::into);
        Ok(GroupAccess::new(group, membership.as_ref()))
    }

    /// Load a game the caller may see, with its access facts.
    async fn visible_game(
        &self,
        actor: Uuid,
        game_id: Uuid,
        action: &'static str,
    ) -> ServiceResult<(Game, GameAccess)> {
        let game: Game = self
            .games
            .find_by_id(game_id)
            .await?
            .ok_or(DomainError::NotFound("Game"))?
            .into();
        let group: Group = self
            .groups
            .find_by_id(game.group_id)
            .await?
            .ok_or(DomainError::NotFound("Game"))?
            .into();

        let access = GameAccess {
            game_id: game.id,
            created_by: game.created_by,
            group: self.group_access(&group, actor).await?,
        };
        if !is_member(actor, &access) {
            return Err(hide(action, actor, "Game"));
        }
        Ok((game, access))
    }

    /// Load a participation the caller may see, with its access facts.
    async fn visible_participation(
        &self,
        actor: Uuid,
        id: Uuid,
        action: &'static str,
    ) -> ServiceResult<(GameParticipation, ParticipationAccess)> {
        let participation: GameParticipation = self
            .participations
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound("Participation"))?
            .into();

        let (_, game) = self
            .visible_game(actor, participation.game_id, action)
            .await
            .map_err(|e| match e {
                ServiceError::Domain(DomainError::NotFound(_)) => {
                    DomainError::NotFound("Participation").into()
                }
                other => other,
            })?;

        let access = ParticipationAccess {
            participation_id: participation.id,
            player_id: participation.player_id,
            game,
        };
        Ok((participation, access))
    }

    async fn game_detail(&self, game_id: Uuid) -> ServiceResult<GameDetail> {
        let details = self
            .games
            .find_with_details(game_id)
            .await?
            .ok_or(DomainError::NotFound("Game"))?;
        let description = details.description.clone();
        let participations = self
            .participations
            .list_for_game(game_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(GameDetail {
            summary: details.into(),
            description,
            participations,
        })
    }

    async fn participation_response(&self, id: Uuid) -> ServiceResult<ParticipationResponse> {
        self.participations
            .find_with_player(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| DomainError::NotFound("Participation").into())
    }

    /// Create a game and post it to the group named by `request.group`.
    pub async fn post_game(
        &self,
        actor: Uuid,
        request: &CreateGameRequest,
    ) -> ServiceResult<GameDetail> {
        let group: Group = self
            .groups
            .find_by_slug(&request.group)
            .await?
            .ok_or(DomainError::NotFound("Group"))?
            .into();
        let access = self.group_access(&group, actor).await?;
        ensure(
            is_member(actor, &access),
            "post_game",
            actor,
            "Only group members can post games",
        )?;

        let new_game = NewGame {
            group_id: group.id,
            title: request.title.as_deref().unwrap_or("").trim(),
            description: request.description.as_deref().unwrap_or("").trim(),
            date: request.date.unwrap_or_else(|| Utc::now().date_naive()),
            location: request.location.as_deref().unwrap_or("").trim(),
            buy_in_cents: request.buy_in_cents,
            created_by: actor,
        };

        let mut tx = self.pool.begin().await?;
        let game: Game = GameRepository::insert_game(&mut *tx, &new_game).await?.into();
        GameRepository::ensure_post(&mut *tx, game.id, group.id, actor).await?;
        tx.commit().await?;

        record_action("post_game");
        tracing::info!(game_id = %game.id, group_id = %group.id, actor = %actor, "Game posted");

        self.game_detail(game.id).await
    }

    /// Games of the caller's groups, optionally one group by slug.
    pub async fn list_games(
        &self,
        actor: Uuid,
        group_slug: Option<&str>,
    ) -> ServiceResult<Vec<GameSummary>> {
        Ok(self
            .games
            .list_for_user(actor, group_slug)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub async fn get_game(&self, actor: Uuid, game_id: Uuid) -> ServiceResult<GameDetail> {
        self.visible_game(actor, game_id, "get_game").await?;
        self.game_detail(game_id).await
    }

    pub async fn update_game(
        &self,
        actor: Uuid,
        game_id: Uuid,
        request: &UpdateGameRequest,
    ) -> ServiceResult<GameDetail> {
        let (game, access) = self.visible_game(actor, game_id, "update_game").await?;
        ensure(
            is_game_creator_or_group_creator(actor, &access),
            "update_game",
            actor,
            GAME_WRITE_DENIED,
        )?;

        let changes = GameChanges {
            title: request.title.as_deref().map(str::trim),
            description: request.description.as_deref().map(str::trim),
            date: request.date,
            location: request.location.as_deref().map(str::trim),
            buy_in_cents: request.buy_in_cents,
        };
        self.games
            .update_game(game.id, &changes)
            .await?
            .ok_or(DomainError::NotFound("Game"))?;

        tracing::info!(game_id = %game.id, actor = %actor, "Game updated");
        self.game_detail(game.id).await
    }

    /// Delete a game with its posts and participations, atomically.
    pub async fn delete_game(&self, actor: Uuid, game_id: Uuid) -> ServiceResult<()> {
        let (game, access) = self.visible_game(actor, game_id, "delete_game").await?;
        ensure(
            is_game_creator_or_group_creator(actor, &access),
            "delete_game",
            actor,
            GAME_WRITE_DENIED,
        )?;

        let mut tx = self.pool.begin().await?;
        let posts = GameRepository::delete_posts(&mut *tx, game.id).await?;
        let participations = ParticipationRepository::delete_for_game(&mut *tx, game.id).await?;
        GameRepository::delete_game(&mut *tx, game.id).await?;
        tx.commit().await?;

        record_action("delete_game");
        tracing::info!(
            game_id = %game.id,
            actor = %actor,
            posts,
            participations,
            "Game deleted"
        );
        Ok(())
    }

    /// Insert or overwrite a player's result for a game.
    pub async fn upsert_participation(
        &self,
        actor: Uuid,
        game_id: Uuid,
        input: &ParticipationInput,
    ) -> ServiceResult<ParticipationResponse> {
        let (game, access) = self
            .visible_game(actor, game_id, "upsert_participation")
            .await?;
        ensure(
            is_game_creator_or_group_creator(actor, &access),
            "upsert_participation",
            actor,
            GAME_WRITE_DENIED,
        )?;

        let player_id = input
            .player_id
            .ok_or_else(|| DomainError::Validation("player_id is required".to_string()))?;
        let final_balance_cents = input
            .final_balance_cents
            .ok_or_else(|| DomainError::Validation("final_balance_cents is required".to_string()))?;

        if self.users.find_by_id(player_id).await?.is_none() {
            return Err(DomainError::NotFound("Player").into());
        }

        let participation: GameParticipation = self
            .participations
            .upsert(
                game.id,
                player_id,
                input.rebuy_cents.unwrap_or(0),
                final_balance_cents,
            )
            .await?
            .into();

        record_action("upsert_participation");
        tracing::info!(
            game_id = %game.id,
            player = %player_id,
            participation_id = %participation.id,
            actor = %actor,
            "Participation recorded"
        );

        self.participation_response(participation.id).await
    }

    pub async fn remove_participation(
        &self,
        actor: Uuid,
        game_id: Uuid,
        player_id: Uuid,
    ) -> ServiceResult<RemoveParticipationResponse> {
        let (game, access) = self
            .visible_game(actor, game_id, "remove_participation")
            .await?;
        ensure(
            is_game_creator_or_group_creator(actor, &access),
            "remove_participation",
            actor,
            GAME_WRITE_DENIED,
        )?;

        let removed = self.participations.remove(game.id, player_id).await? > 0;

        record_action("remove_participation");
        tracing::info!(game_id = %game.id, player = %player_id, actor = %actor, removed, "Participation removed");

        Ok(RemoveParticipationResponse {
            removed,
            game_id: game.id,
            player_id,
        })
    }

    /// Participations of games in the caller's groups.
    pub async fn list_participations(
        &self,
        actor: Uuid,
        game_id: Option<Uuid>,
    ) -> ServiceResult<Vec<ParticipationResponse>> {
        Ok(self
            .participations
            .list_for_user_groups(actor, game_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub async fn get_participation(
        &self,
        actor: Uuid,
        id: Uuid,
    ) -> ServiceResult<ParticipationResponse> {
        self.visible_participation(actor, id, "get_participation")
            .await?;
        self.participation_response(id).await
    }

    pub async fn update_participation(
        &self,
        actor: Uuid,
        id: Uuid,
        request: &UpdateParticipationRequest,
    ) -> ServiceResult<ParticipationResponse> {
        let (participation, access) = self
            .visible_participation(actor, id, "update_participation")
            .await?;
        ensure(
            is_self_or_game_creator(actor, &access),
            "update_participation",
            actor,
            "Only the player or the game's creators can edit this result",
        )?;

        self.participations
            .update(
                participation.id,
                request.rebuy_cents,
                request.final_balance_cents,
            )
            .await?
            .ok_or(DomainError::NotFound("Participation"))?;

        tracing::info!(participation_id = %participation.id, actor = %actor, "Participation updated");
        self.participation_response(participation.id).await
    }

    pub async fn delete_participation(&self, actor: Uuid, id: Uuid) -> ServiceResult<()> {
        let (participation, access) = self
            .visible_participation(actor, id, "delete_participation")
            .await?;
        ensure(
            is_self_or_game_creator(actor, &access),
            "delete_participation",
            actor,
            "Only the player or the game's creators can delete this result",
        )?;

        self.participations.delete_by_id(participation.id).await?;

        record_action("delete_participation");
        tracing::info!(participation_id = %participation.id, actor = %actor, "Participation deleted");
        Ok(())
    }
}
