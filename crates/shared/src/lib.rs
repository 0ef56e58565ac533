//! Shared types and configuration for Vidya.
//!
//! This crate provides common types used across all other crates:
//! - Configuration management
//! - JWT claims and token validation

pub mod auth;
pub mod config;
pub mod jwt;

pub use auth::Claims;
pub use config::{AppConfig, FeesConfig};
pub use jwt::{JwtConfig, JwtError, JwtService};
