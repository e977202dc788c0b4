//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared types
//!
//! The service crate wraps these with axum middleware and handlers.

pub mod auth;
pub mod signature;
pub mod types;

pub use auth::{
    authenticate_request, calculate_hash, sign_request, validate_hash, validate_timestamp,
    ApiAuthError,
};
pub use signature::{sign_payload, verify_signature, SIGNATURE_HEADER};
pub use types::{ErrorBody, StatusBody};
