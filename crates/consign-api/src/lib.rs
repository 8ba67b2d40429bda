//! Consign API Library
//!
//! HTTP surface of the consignment intake: the form handler, the notification
//! transports, middleware, and application setup.

mod handlers;
mod middleware;
mod telemetry;

pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use services::email::{DeliveryError, Notifier};
pub use services::intake::{IntakeOutcome, IntakeService, NotificationStatus};
pub use state::AppState;
