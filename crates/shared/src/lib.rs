//! Shared types, errors, and configuration for SplitLedger.
//!
//! This crate provides common types used across all other crates:
//! - Monetary helpers with decimal precision
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - Bearer token claims and validation

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use config::JwtConfig;
pub use jwt::{JwtService, TokenError};
