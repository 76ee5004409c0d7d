//! Domain models for Pokerdex.

pub mod game;
pub mod group;
pub mod group_request;
pub mod user;

pub use game::{Game, GameParticipation, GamePost};
pub use group::{Group, GroupMembership, GroupRole};
pub use group_request::GroupRequest;
pub use user::{User, UserPublic};
