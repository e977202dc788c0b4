//! HTTP API handlers for lms-web

pub mod auth;
pub mod buildinfo;
pub mod checkout;
pub mod health;
pub mod learning;
pub mod webhook;

pub use auth::auth_middleware;
pub use buildinfo::get_build_info;
pub use checkout::{checkout, enroll};
pub use health::health_routes;
pub use learning::{course_access, my_courses, students, update_progress};
pub use webhook::payment_webhook;
