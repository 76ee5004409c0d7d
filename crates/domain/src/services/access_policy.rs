//! Access policy for groups and the ledger objects they own.
//!
//! Predicates are pure: callers load the facts (group creator, the actor's
//! membership, game creator, participation player) and the predicates only
//! compare them. Every protected object exposes its governing group through
//! [`HasOwningGroup`].

use uuid::Uuid;

use crate::errors::DomainError;
use crate::models::{Group, GroupMembership, GroupRole};

/// The acting user's membership row in a group, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberFact {
    pub user_id: Uuid,
    pub role: GroupRole,
}

/// Facts about a group needed for access decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupAccess {
    pub group_id: Uuid,
    pub created_by: Uuid,
    pub membership: Option<MemberFact>,
}

impl GroupAccess {
    pub fn new(group: &Group, membership: Option<&GroupMembership>) -> Self {
        Self {
            group_id: group.id,
            created_by: group.created_by,
            membership: membership.map(|m| MemberFact {
                user_id: m.user_id,
                role: m.role,
            }),
        }
    }

    /// Role of `actor` in this group, if the loaded membership is theirs.
    fn role_of(&self, actor: Uuid) -> Option<GroupRole> {
        self.membership
            .filter(|m| m.user_id == actor)
            .map(|m| m.role)
    }
}

/// Facts about a game: its creator and its owning group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameAccess {
    pub game_id: Uuid,
    pub created_by: Uuid,
    pub group: GroupAccess,
}

/// Facts about a participation: its player and its game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipationAccess {
    pub participation_id: Uuid,
    pub player_id: Uuid,
    pub game: GameAccess,
}

/// Anything whose permissions derive from a group.
pub trait HasOwningGroup {
    fn owning_group(&self) -> &GroupAccess;
}

impl HasOwningGroup for GroupAccess {
    fn owning_group(&self) -> &GroupAccess {
        self
    }
}

impl HasOwningGroup for GameAccess {
    fn owning_group(&self) -> &GroupAccess {
        &self.group
    }
}

impl HasOwningGroup for ParticipationAccess {
    fn owning_group(&self) -> &GroupAccess {
        &self.game.group
    }
}

/// Anything tied to a game (the game itself or one of its participations).
pub trait HasGame {
    fn game(&self) -> &GameAccess;
}

impl HasGame for GameAccess {
    fn game(&self) -> &GameAccess {
        self
    }
}

impl HasGame for ParticipationAccess {
    fn game(&self) -> &GameAccess {
        &self.game
    }
}

/// A membership row exists for the actor in the target's group.
pub fn is_member<T: HasOwningGroup + ?Sized>(actor: Uuid, target: &T) -> bool {
    target.owning_group().role_of(actor).is_some()
}

/// Actor holds ADMIN or OWNER, or is the group creator.
pub fn is_admin<T: HasOwningGroup + ?Sized>(actor: Uuid, target: &T) -> bool {
    let group = target.owning_group();
    group.created_by == actor || group.role_of(actor).is_some_and(|r| r.is_admin_tier())
}

/// Actor is the creator of the target's group.
pub fn is_creator<T: HasOwningGroup + ?Sized>(actor: Uuid, target: &T) -> bool {
    target.owning_group().created_by == actor
}

/// Actor created the game, or created the game's group.
pub fn is_game_creator_or_group_creator<T: HasGame + ?Sized>(actor: Uuid, target: &T) -> bool {
    let game = target.game();
    game.created_by == actor || game.group.created_by == actor
}

/// Actor is the participation's player, or passes
/// [`is_game_creator_or_group_creator`].
pub fn is_self_or_game_creator(actor: Uuid, target: &ParticipationAccess) -> bool {
    target.player_id == actor || is_game_creator_or_group_creator(actor, target)
}

/// Turns a policy decision into `Forbidden` when denied.
pub fn require(allowed: bool, reason: &str) -> Result<(), DomainError> {
    if allowed {
        Ok(())
    } else {
        Err(DomainError::forbidden(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cast {
        creator: Uuid,
        admin: Uuid,
        member: Uuid,
        outsider: Uuid,
        group_id: Uuid,
    }

    fn cast() -> Cast {
        Cast {
            creator: Uuid::new_v4(),
            admin: Uuid::new_v4(),
            member: Uuid::new_v4(),
            outsider: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
        }
    }

    fn access_for(c: &Cast, actor: Uuid) -> GroupAccess {
        let role = if actor == c.creator {
            Some(GroupRole::Owner)
        } else if actor == c.admin {
            Some(GroupRole::Admin)
        } else if actor == c.member {
            Some(GroupRole::Member)
        } else {
            None
        };
        GroupAccess {
            group_id: c.group_id,
            created_by: c.creator,
            membership: role.map(|role| MemberFact {
                user_id: actor,
                role,
            }),
        }
    }

    fn game_for(c: &Cast, actor: Uuid, game_creator: Uuid) -> GameAccess {
        GameAccess {
            game_id: Uuid::new_v4(),
            created_by: game_creator,
            group: access_for(c, actor),
        }
    }

    #[test]
    fn test_is_member() {
        let c = cast();
        assert!(is_member(c.creator, &access_for(&c, c.creator)));
        assert!(is_member(c.admin, &access_for(&c, c.admin)));
        assert!(is_member(c.member, &access_for(&c, c.member)));
        assert!(!is_member(c.outsider, &access_for(&c, c.outsider)));
    }

    #[test]
    fn test_membership_of_other_user_does_not_count() {
        let c = cast();
        let admins_view = access_for(&c, c.admin);
        assert!(!is_member(c.outsider, &admins_view));
        assert!(!is_admin(c.outsider, &admins_view));
    }

    #[test]
    fn test_is_admin() {
        let c = cast();
        assert!(is_admin(c.creator, &access_for(&c, c.creator)));
        assert!(is_admin(c.admin, &access_for(&c, c.admin)));
        assert!(!is_admin(c.member, &access_for(&c, c.member)));
        assert!(!is_admin(c.outsider, &access_for(&c, c.outsider)));
    }

    #[test]
    fn test_creator_is_admin_even_with_stale_role() {
        let c = cast();
        let access = GroupAccess {
            group_id: c.group_id,
            created_by: c.creator,
            membership: Some(MemberFact {
                user_id: c.creator,
                role: GroupRole::Member,
            }),
        };
        assert!(is_admin(c.creator, &access));
    }

    #[test]
    fn test_is_creator() {
        let c = cast();
        assert!(is_creator(c.creator, &access_for(&c, c.creator)));
        assert!(!is_creator(c.admin, &access_for(&c, c.admin)));
    }

    #[test]
    fn test_game_predicates_follow_owning_group() {
        let c = cast();
        let game = game_for(&c, c.member, c.admin);
        assert!(is_member(c.member, &game));
        assert!(!is_admin(c.member, &game));
    }

    #[test]
    fn test_is_game_creator_or_group_creator() {
        let c = cast();
        assert!(is_game_creator_or_group_creator(
            c.admin,
            &game_for(&c, c.admin, c.admin)
        ));
        assert!(is_game_creator_or_group_creator(
            c.creator,
            &game_for(&c, c.creator, c.admin)
        ));
        // Group admins who did not create the game are not enough.
        assert!(!is_game_creator_or_group_creator(
            c.admin,
            &game_for(&c, c.admin, c.member)
        ));
    }

    #[test]
    fn test_is_self_or_game_creator() {
        let c = cast();
        let participation = |actor: Uuid| ParticipationAccess {
            participation_id: Uuid::new_v4(),
            player_id: c.member,
            game: game_for(&c, actor, c.admin),
        };

        assert!(is_self_or_game_creator(c.member, &participation(c.member)));
        assert!(is_self_or_game_creator(c.admin, &participation(c.admin)));
        assert!(is_self_or_game_creator(c.creator, &participation(c.creator)));
        assert!(!is_self_or_game_creator(c.outsider, &participation(c.outsider)));
    }

    #[test]
    fn test_participation_owning_group() {
        let c = cast();
        let p = ParticipationAccess {
            participation_id: Uuid::new_v4(),
            player_id: c.member,
            game: game_for(&c, c.member, c.creator),
        };
        assert_eq!(p.owning_group().group_id, c.group_id);
        assert!(is_member(c.member, &p));
    }

    #[test]
    fn test_require() {
        assert!(require(true, "ok").is_ok());
        assert_eq!(
            require(false, "Only group admins can do that"),
            Err(DomainError::Forbidden(
                "Only group admins can do that".to_string()
            ))
        );
    }
}
