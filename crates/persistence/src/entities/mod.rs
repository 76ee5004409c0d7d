//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod game;
pub mod group;
pub mod group_request;
pub mod user;

pub use game::{
    GameEntity, GamePostEntity, GamePostWithDetailsEntity, GameWithDetailsEntity,
    ParticipationEntity, ParticipationWithPlayerEntity,
};
pub use group::{
    GroupEntity, GroupListingEntity, GroupMembershipEntity, GroupRelation, GroupRoleDb,
    MemberWithUserEntity,
};
pub use group_request::{GroupRequestEntity, GroupRequestWithDetailsEntity};
pub use user::{PasswordResetTokenEntity, UserEntity, UserSessionEntity};
