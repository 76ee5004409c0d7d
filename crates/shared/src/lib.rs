//! Shared utilities for the Pokerdex backend.
//!
//! This crate provides functionality used across all other crates:
//! - Token hashing and secure random tokens
//! - Password hashing with Argon2id
//! - JWT issue and verification
//! - Validators for money amounts and usernames

pub mod crypto;
pub mod jwt;
pub mod password;
pub mod validation;
