//! # LMS Common Library
//!
//! Shared code for the course marketplace services including:
//! - Database initialization and models
//! - Configuration loading
//! - Decimal money helpers
//! - Webhook signature and internal API authentication primitives
//! - Timestamp utilities

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod money;
pub mod time;

pub use error::{Error, Result};
