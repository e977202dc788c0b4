//! Business logic behind the HTTP handlers

pub mod checkout;
pub mod enrollment;
pub mod payments;
pub mod progress;

pub use checkout::{enroll_free, new_invoice_id, start_checkout, CheckoutOutcome, EnrollOutcome};
pub use enrollment::{course_students, grant_access, has_access, GrantOutcome};
pub use payments::{reconcile, Notification, ReconcileError, ReconcileOutcome, Transition};
pub use progress::{record_progress, ProgressOutcome};
