//! HTTP route handlers.

pub mod auth;
pub mod games;
pub mod group_requests;
pub mod groups;
pub mod health;
pub mod participations;
pub mod password_reset;
