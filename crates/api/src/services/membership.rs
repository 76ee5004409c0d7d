//! Group membership engine: groups, join requests, roles and ownership
//! succession.

use domain::models::game::{GamePostSummary, GameSummary};
use domain::models::group::{
    first_free_slug, generate_slug, CreateGroupRequest, GroupDetail, GroupSummary,
    ListGroupsResponse, MemberResponse, RemoveMemberResponse, RoleChangeResponse,
    UpdateGroupRequest,
};
use domain::models::group_request::{AcceptRequestResponse, GroupRequestResponse};
use domain::models::user::UserPublic;
use domain::models::{Group, GroupMembership, GroupRequest, GroupRole, User};
use domain::services::{
    is_admin, is_creator, is_member, select_successor, GroupAccess, LeaveOutcome, MemberFact,
};
use domain::DomainError;
use persistence::entities::GroupRelation;
use persistence::repositories::{
    GameRepository, GroupRepository, GroupRequestRepository, UserRepository,
    GROUP_SLUG_CONSTRAINT,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::middleware::metrics::record_action;
use crate::services::{ensure, unique_violation, ServiceError, ServiceResult};

const GROUP_NAME_CONSTRAINT: &str = "groups_name_key";

/// Concurrent creations can race for the same slug; each attempt re-reads the
/// taken suffixes.
const MAX_SLUG_ATTEMPTS: u32 = 5;

/// Number of posts and games shown on a group's detail page.
const RECENT_LIMIT: i64 = 10;

fn duplicate_name() -> ServiceError {
    DomainError::Conflict("A group with this name already exists".to_string()).into()
}

/// Access facts for `actor` from an already-loaded roster.
fn access_in(group: &Group, roster: &[GroupMembership], actor: Uuid) -> GroupAccess {
    GroupAccess::new(group, roster.iter().find(|m| m.user_id == actor))
}

pub struct MembershipService {
    pool: PgPool,
    groups: GroupRepository,
    requests: GroupRequestRepository,
    games: GameRepository,
    users: UserRepository,
}

impl MembershipService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            groups: GroupRepository::new(pool.clone()),
            requests: GroupRequestRepository::new(pool.clone()),
            games: GameRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }

    async fn group_by_slug(&self, slug: &str) -> ServiceResult<Group> {
        self.groups
            .find_by_slug(slug)
            .await?
            .map(Group::from)
            .ok_or_else(|| DomainError::NotFound("Group").into())
    }

    async fn access_for(&self, group: &Group, actor: Uuid) -> ServiceResult<GroupAccess> {
        let membership: Option<GroupMembership> = self
            .groups
            .get_membership(group.id, actor)
            .await?
            .map(Into::into);
        Ok(GroupAccess::new(group, membership.as_ref()))
    }

    /// Lock the group row and load its roster inside `conn`'s transaction.
    async fn lock_with_roster(
        conn: &mut PgConnection,
        group_id: Uuid,
    ) -> ServiceResult<(Group, Vec<GroupMembership>)> {
        let group: Group = GroupRepository::lock_group(&mut *conn, group_id)
            .await?
            .ok_or(DomainError::NotFound("Group"))?
            .into();
        let roster = GroupRepository::list_memberships(&mut *conn, group_id)
            .await?
            .into_iter()
            .map(GroupMembership::from)
            .collect();
        Ok((group, roster))
    }

    /// Create a group with `creator` as its OWNER.
    pub async fn create_group(
        &self,
        creator: Uuid,
        request: &CreateGroupRequest,
    ) -> ServiceResult<Group> {
        let name = request.name.trim();
        let description = request.description.as_deref().unwrap_or("").trim();
        let base = generate_slug(name);

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let mut tx = self.pool.begin().await?;

            let taken = GroupRepository::taken_slugs(&mut *tx, &base).await?;
            let slug = first_free_slug(&base, &taken);

            let group: Group = match GroupRepository::insert_group(
                &mut *tx,
                name,
                &slug,
                description,
                creator,
            )
            .await
            {
                Ok(entity) => entity.into(),
                Err(e) => match unique_violation(&e) {
                    Some(GROUP_SLUG_CONSTRAINT) => {
                        tracing::debug!(slug = %slug, attempt, "Slug taken concurrently, retrying");
                        continue;
                    }
                    Some(GROUP_NAME_CONSTRAINT) => return Err(duplicate_name()),
                    _ => return Err(e.into()),
                },
            };

            GroupRepository::add_member(&mut *tx, group.id, creator, GroupRole::Owner).await?;
            tx.commit().await?;

            record_action("create_group");
            tracing::info!(group_id = %group.id, slug = %group.slug, creator = %creator, "Group created");
            return Ok(group);
        }

        tracing::warn!(base = %base, "No free slug after retries");
        Err(DomainError::Conflict("Could not allocate a unique slug for this group".to_string()).into())
    }

    /// All groups split by the caller's relation to them.
    pub async fn list_groups(
        &self,
        actor: Uuid,
        search: Option<&str>,
    ) -> ServiceResult<ListGroupsResponse> {
        let mut response = ListGroupsResponse {
            my_groups: Vec::new(),
            pending_groups: Vec::new(),
            other_groups: Vec::new(),
        };

        for row in self.groups.list_groups_for_user(actor, search).await? {
            let relation = row.relation();
            let summary = GroupSummary::from(row);
            match relation {
                GroupRelation::Member => response.my_groups.push(summary),
                GroupRelation::Pending => response.pending_groups.push(summary),
                GroupRelation::Other => response.other_groups.push(summary),
            }
        }
        Ok(response)
    }

    pub async fn get_group(&self, actor: Uuid, slug: &str) -> ServiceResult<GroupDetail> {
        let group = self.group_by_slug(slug).await?;

        let memberships: Vec<MemberResponse> = self
            .groups
            .list_members(group.id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        let access = GroupAccess {
            group_id: group.id,
            created_by: group.created_by,
            membership: memberships
                .iter()
                .find(|m| m.user.id == actor)
                .map(|m| MemberFact {
                    user_id: m.user.id,
                    role: m.role,
                }),
        };

        let creator = match memberships.iter().find(|m| m.user.id == group.created_by) {
            Some(m) => m.user.clone(),
            None => {
                let user: User = self
                    .users
                    .find_by_id(group.created_by)
                    .await?
                    .ok_or(DomainError::NotFound("User"))?
                    .into();
                UserPublic::from(&user)
            }
        };

        // Ledger activity stays hidden from outsiders, like the games themselves.
        let (recent_posts, recent_games) = if is_member(actor, &access) {
            let posts: Vec<GamePostSummary> = self
                .games
                .recent_posts_for_group(group.id, RECENT_LIMIT)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            let games: Vec<GameSummary> = self
                .games
                .recent_for_group(group.id, RECENT_LIMIT)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            (posts, games)
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(GroupDetail {
            is_member: is_member(actor, &access),
            is_admin: is_admin(actor, &access),
            is_creator: is_creator(actor, &access),
            id: group.id,
            name: group.name,
            slug: group.slug,
            description: group.description,
            created_by: creator,
            created_at: group.created_at,
            memberships,
            recent_posts,
            recent_games,
        })
    }

    /// Rename or re-describe a group. The slug never changes.
    pub async fn update_group(
        &self,
        actor: Uuid,
        slug: &str,
        request: &UpdateGroupRequest,
    ) -> ServiceResult<Group> {
        let group = self.group_by_slug(slug).await?;
        let access = self.access_for(&group, actor).await?;
        ensure(
            is_admin(actor, &access),
            "update_group",
            actor,
            "Only group admins can edit the group",
        )?;

        let name = request.name.as_deref().map(str::trim);
        let description = request.description.as_deref().map(str::trim);

        let updated: Group = match self.groups.update_group(group.id, name, description).await {
            Ok(entity) => entity.ok_or(DomainError::NotFound("Group"))?.into(),
            Err(e) if unique_violation(&e) == Some(GROUP_NAME_CONSTRAINT) => {
                return Err(duplicate_name())
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(group_id = %group.id, actor = %actor, "Group updated");
        Ok(updated)
    }

    /// Delete a group and everything it owns.
    pub async fn delete_group(&self, actor: Uuid, slug: &str) -> ServiceResult<()> {
        let group = self.group_by_slug(slug).await?;
        let access = GroupAccess::new(&group, None);
        ensure(
            is_creator(actor, &access),
            "delete_group",
            actor,
            "Only the group creator can delete the group",
        )?;

        let mut conn = self.pool.acquire().await?;
        GroupRepository::delete_group(&mut *conn, group.id).await?;

        record_action("delete_group");
        tracing::info!(group_id = %group.id, actor = %actor, "Group deleted");
        Ok(())
    }

    /// File a join request for the group with this slug.
    pub async fn request_join(
        &self,
        actor: Uuid,
        slug: &str,
        message: Option<&str>,
    ) -> ServiceResult<GroupRequestResponse> {
        let group = self.group_by_slug(slug).await?;

        if self.groups.get_membership(group.id, actor).await?.is_some() {
            return Err(DomainError::already_member().into());
        }

        let message = message.map(str::trim).filter(|m| !m.is_empty());
        let request: GroupRequest = self
            .requests
            .create_request(group.id, actor, message)
            .await?
            .ok_or_else(DomainError::duplicate_request)?
            .into();

        record_action("request_join");
        tracing::info!(group_id = %group.id, request_id = %request.id, user = %actor, "Join request created");

        self.requests
            .find_with_details(request.id)
            .await?
            .map(Into::into)
            .ok_or_else(|| DomainError::NotFound("Group request").into())
    }

    /// Requests the caller filed plus those of groups they administer.
    pub async fn list_requests(&self, actor: Uuid) -> ServiceResult<Vec<GroupRequestResponse>> {
        Ok(self
            .requests
            .list_visible_to(actor)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Load a request with its group and check that the caller is the
    /// requester or an admin of the group.
    async fn visible_request(
        &self,
        actor: Uuid,
        id: Uuid,
        action: &'static str,
    ) -> ServiceResult<GroupRequest> {
        let request: GroupRequest = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound("Group request"))?
            .into();

        if request.requested_by != actor {
            let group: Group = self
                .groups
                .find_by_id(request.group_id)
                .await?
                .ok_or(DomainError::NotFound("Group"))?
                .into();
            let access = self.access_for(&group, actor).await?;
            ensure(
                is_admin(actor, &access),
                action,
                actor,
                "Only the requester or a group admin can do this",
            )?;
        }
        Ok(request)
    }

    pub async fn get_request(&self, actor: Uuid, id: Uuid) -> ServiceResult<GroupRequestResponse> {
        self.visible_request(actor, id, "get_group_request").await?;
        self.requests
            .find_with_details(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| DomainError::NotFound("Group request").into())
    }

    /// Delete a request: an admin rejecting it or the requester withdrawing it.
    pub async fn reject_request(&self, actor: Uuid, id: Uuid) -> ServiceResult<()> {
        let request = self.visible_request(actor, id, "reject_group_request").await?;

        let mut conn = self.pool.acquire().await?;
        GroupRequestRepository::delete_request(&mut *conn, request.id).await?;

        record_action("reject_request");
        tracing::info!(request_id = %request.id, group_id = %request.group_id, actor = %actor, "Join request deleted");
        Ok(())
    }

    /// Turn a request into a MEMBER membership and delete it, atomically.
    ///
    /// Locks the group before the request, the same order `leave` takes them
    /// when it deletes a group.
    pub async fn accept_request(
        &self,
        actor: Uuid,
        id: Uuid,
    ) -> ServiceResult<AcceptRequestResponse> {
        let group_id = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound("Group request"))?
            .group_id;

        let mut tx = self.pool.begin().await?;
        let (group, roster) = Self::lock_with_roster(&mut *tx, group_id).await?;

        let request: GroupRequest = GroupRequestRepository::lock_request(&mut *tx, id)
            .await?
            .filter(|r| r.group_id == group.id)
            .ok_or(DomainError::NotFound("Group request"))?
            .into();

        ensure(
            is_admin(actor, &access_in(&group, &roster, actor)),
            "accept_group_request",
            actor,
            "Only group admins can accept join requests",
        )?;

        let membership_created = GroupRepository::add_member(
            &mut *tx,
            request.group_id,
            request.requested_by,
            GroupRole::Member,
        )
        .await?;
        GroupRequestRepository::delete_request(&mut *tx, request.id).await?;

        tx.commit().await?;

        record_action("accept_request");
        tracing::info!(
            group_id = %request.group_id,
            user = %request.requested_by,
            actor = %actor,
            membership_created,
            "Join request accepted"
        );

        Ok(AcceptRequestResponse {
            group_id: request.group_id,
            user_id: request.requested_by,
            membership_created,
        })
    }

    pub async fn promote(
        &self,
        actor: Uuid,
        slug: &str,
        target: Uuid,
    ) -> ServiceResult<RoleChangeResponse> {
        self.change_role(actor, slug, target, GroupRole::Admin, "promote_member")
            .await
    }

    pub async fn demote(
        &self,
        actor: Uuid,
        slug: &str,
        target: Uuid,
    ) -> ServiceResult<RoleChangeResponse> {
        self.change_role(actor, slug, target, GroupRole::Member, "demote_member")
            .await
    }

    async fn change_role(
        &self,
        actor: Uuid,
        slug: &str,
        target: Uuid,
        role: GroupRole,
        action: &'static str,
    ) -> ServiceResult<RoleChangeResponse> {
        let group_id = self.group_by_slug(slug).await?.id;

        let mut tx = self.pool.begin().await?;
        let (group, roster) = Self::lock_with_roster(&mut *tx, group_id).await?;

        ensure(
            is_admin(actor, &access_in(&group, &roster, actor)),
            action,
            actor,
            "Only group admins can change roles",
        )?;
        if target == group.created_by {
            return Err(DomainError::creator_target().into());
        }

        let membership: GroupMembership =
            GroupRepository::update_member_role(&mut *tx, group.id, target, role)
                .await?
                .ok_or(DomainError::NotFound("Membership"))?
                .into();

        tx.commit().await?;

        record_action(action);
        tracing::info!(group_id = %group.id, target = %target, role = %role, actor = %actor, "Member role changed");

        Ok(RoleChangeResponse {
            group_id: group.id,
            user_id: membership.user_id,
            role: membership.role,
        })
    }

    pub async fn remove_member(
        &self,
        actor: Uuid,
        slug: &str,
        target: Uuid,
    ) -> ServiceResult<RemoveMemberResponse> {
        let group_id = self.group_by_slug(slug).await?.id;

        let mut tx = self.pool.begin().await?;
        let (group, roster) = Self::lock_with_roster(&mut *tx, group_id).await?;

        ensure(
            is_admin(actor, &access_in(&group, &roster, actor)),
            "remove_member",
            actor,
            "Only group admins can remove members",
        )?;
        if target == group.created_by {
            return Err(DomainError::creator_target().into());
        }

        let removed = GroupRepository::remove_member(&mut *tx, group.id, target).await? > 0;
        tx.commit().await?;

        record_action("remove_member");
        tracing::info!(group_id = %group.id, target = %target, actor = %actor, removed, "Member removed");

        Ok(RemoveMemberResponse {
            removed,
            user_id: target,
            group_id: group.id,
        })
    }

    /// Leave a group. A departing creator hands the group to a successor, or
    /// deletes it when nobody else is left.
    pub async fn leave(&self, actor: Uuid, slug: &str) -> ServiceResult<LeaveOutcome> {
        let group_id = self.group_by_slug(slug).await?.id;

        let mut tx = self.pool.begin().await?;
        let (group, roster) = Self::lock_with_roster(&mut *tx, group_id).await?;

        if !is_member(actor, &access_in(&group, &roster, actor)) {
            return Err(DomainError::NotFound("Membership").into());
        }

        let outcome = if actor != group.created_by {
            GroupRepository::remove_member(&mut *tx, group.id, actor).await?;
            LeaveOutcome::Left
        } else {
            match select_successor(&roster, actor) {
                Some(successor) => {
                    GroupRepository::set_creator(&mut *tx, group.id, successor).await?;
                    GroupRepository::update_member_role(
                        &mut *tx,
                        group.id,
                        successor,
                        GroupRole::Admin,
                    )
                    .await?;
                    GroupRepository::remove_member(&mut *tx, group.id, actor).await?;
                    LeaveOutcome::OwnershipTransferred {
                        new_creator: successor,
                    }
                }
                None => {
                    GroupRepository::delete_group(&mut *tx, group.id).await?;
                    LeaveOutcome::GroupDeleted
                }
            }
        };

        tx.commit().await?;

        record_action("leave_group");
        tracing::info!(
            group_id = %group.id,
            user = %actor,
            outcome = outcome.as_str(),
            new_creator = ?outcome.new_creator(),
            "Left group"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn group(created_by: Uuid) -> Group {
        Group {
            id: Uuid::new_v4(),
            name: "Friday Night".to_string(),
            slug: "friday-night".to_string(),
            description: String::new(),
            created_by,
            created_at: Utc::now(),
        }
    }

    fn membership(group: &Group, user_id: Uuid, role: GroupRole) -> GroupMembership {
        GroupMembership {
            id: Uuid::new_v4(),
            group_id: group.id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_in_picks_actor_row() {
        let creator = Uuid::new_v4();
        let member = Uuid::new_v4();
        let g = group(creator);
        let roster = vec![
            membership(&g, creator, GroupRole::Owner),
            membership(&g, member, GroupRole::Member),
        ];

        let access = access_in(&g, &roster, member);
        assert!(is_member(member, &access));
        assert!(!is_admin(member, &access));

        let outsider = Uuid::new_v4();
        assert!(!is_member(outsider, &access_in(&g, &roster, outsider)));
    }

    #[test]
    fn test_creator_is_admin_even_with_stale_role() {
        let creator = Uuid::new_v4();
        let g = group(creator);
        let roster = vec![membership(&g, creator, GroupRole::Member)];
        assert!(is_admin(creator, &access_in(&g, &roster, creator)));
    }

    #[test]
    fn test_duplicate_name_is_conflict() {
        assert!(matches!(
            duplicate_name(),
            ServiceError::Domain(DomainError::Conflict(_))
        ));
    }
}
