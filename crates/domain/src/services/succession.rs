//! Ownership succession when a group creator leaves.

use uuid::Uuid;

use crate::models::GroupMembership;

/// What happened when a user left a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// A regular member left.
    Left,
    /// The creator left and `new_creator` took over as ADMIN.
    OwnershipTransferred { new_creator: Uuid },
    /// The creator was the last member; the group is gone.
    GroupDeleted,
}

impl LeaveOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveOutcome::Left => "left",
            LeaveOutcome::OwnershipTransferred { .. } => "ownership_transferred",
            LeaveOutcome::GroupDeleted => "group_deleted",
        }
    }

    pub fn new_creator(&self) -> Option<Uuid> {
        match self {
            LeaveOutcome::OwnershipTransferred { new_creator } => Some(*new_creator),
            _ => None,
        }
    }
}

/// Picks who inherits a group from `leaving_user`.
///
/// Admin-tier members (ADMIN, or a stale OWNER row) come first, then plain
/// members; within a tier the earliest `joined_at` wins and ties break on
/// user id. Returns `None` when nobody else is left.
pub fn select_successor(memberships: &[GroupMembership], leaving_user: Uuid) -> Option<Uuid> {
    memberships
        .iter()
        .filter(|m| m.user_id != leaving_user)
        .min_by_key(|m| (!m.role.is_admin_tier(), m.joined_at, m.user_id))
        .map(|m| m.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupRole;
    use chrono::{Duration, TimeZone, Utc};

    fn membership(user_id: Uuid, role: GroupRole, minutes: i64) -> GroupMembership {
        let base = Utc.with_ymd_and_hms(2024, 1, 5, 20, 0, 0).unwrap();
        GroupMembership {
            id: Uuid::new_v4(),
            group_id: Uuid::nil(),
            user_id,
            role,
            joined_at: base + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_no_successor_when_alone() {
        let creator = Uuid::new_v4();
        let roster = vec![membership(creator, GroupRole::Owner, 0)];
        assert_eq!(select_successor(&roster, creator), None);
    }

    #[test]
    fn test_earliest_admin_wins_over_earlier_member() {
        let creator = Uuid::new_v4();
        let early_member = Uuid::new_v4();
        let late_admin = Uuid::new_v4();
        let later_admin = Uuid::new_v4();
        let roster = vec![
            membership(creator, GroupRole::Owner, 0),
            membership(early_member, GroupRole::Member, 1),
            membership(later_admin, GroupRole::Admin, 30),
            membership(late_admin, GroupRole::Admin, 10),
        ];
        assert_eq!(select_successor(&roster, creator), Some(late_admin));
    }

    #[test]
    fn test_earliest_member_when_no_admin() {
        let creator = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let roster = vec![
            membership(creator, GroupRole::Owner, 0),
            membership(second, GroupRole::Member, 20),
            membership(first, GroupRole::Member, 5),
        ];
        assert_eq!(select_successor(&roster, creator), Some(first));
    }

    #[test]
    fn test_stale_owner_row_counts_as_admin_tier() {
        let creator = Uuid::new_v4();
        let member = Uuid::new_v4();
        let former_owner = Uuid::new_v4();
        let roster = vec![
            membership(member, GroupRole::Member, 1),
            membership(creator, GroupRole::Owner, 2),
            membership(former_owner, GroupRole::Owner, 3),
        ];
        assert_eq!(select_successor(&roster, creator), Some(former_owner));
    }

    #[test]
    fn test_tie_on_joined_at_breaks_on_user_id() {
        let creator = Uuid::new_v4();
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let roster = vec![
            membership(creator, GroupRole::Owner, 0),
            membership(b, GroupRole::Member, 7),
            membership(a, GroupRole::Member, 7),
        ];
        assert_eq!(select_successor(&roster, creator), Some(a));
    }

    #[test]
    fn test_outcome_labels() {
        let id = Uuid::new_v4();
        assert_eq!(LeaveOutcome::Left.as_str(), "left");
        assert_eq!(LeaveOutcome::GroupDeleted.new_creator(), None);
        let transferred = LeaveOutcome::OwnershipTransferred { new_creator: id };
        assert_eq!(transferred.as_str(), "ownership_transferred");
        assert_eq!(transferred.new_creator(), Some(id));
    }
}
