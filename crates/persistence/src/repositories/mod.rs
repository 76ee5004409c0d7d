//! Repository implementations for database operations.

pub mod game;
pub mod group;
pub mod group_request;
pub mod participation;
pub mod user;

pub use game::{GameChanges, GameRepository, NewGame};
pub use group::{like_pattern, GroupRepository, GROUP_SLUG_CONSTRAINT};
pub use group_request::GroupRequestRepository;
pub use participation::ParticipationRepository;
pub use user::UserRepository;
