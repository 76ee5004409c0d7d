//! Domain layer for the Pokerdex backend.
//!
//! This crate contains:
//! - Domain models (User, Group, GroupRequest, Game, GameParticipation)
//! - The access policy and ownership succession rules
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;

pub use errors::DomainError;
