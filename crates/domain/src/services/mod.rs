//! Domain services for Pokerdex.
//!
//! Pure rules that operate on already-loaded domain models.

pub mod access_policy;
pub mod succession;

pub use access_policy::{
    is_admin, is_creator, is_game_creator_or_group_creator, is_member, is_self_or_game_creator,
    require, GameAccess, GroupAccess, HasGame, HasOwningGroup, MemberFact, ParticipationAccess,
};
pub use succession::{select_successor, LeaveOutcome};
