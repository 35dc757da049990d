//! Built-in middleware implementations
//!
//! - **Logging**: tool call outcome and duration
//! - **Authentication**: rejects calls without an established backend session

mod auth;
mod logging;

pub use auth::{AuthMiddleware, DATABASE_METADATA_KEY, MISSING_SESSION_MESSAGE, NOT_CONNECTED_MESSAGE};
pub use logging::LoggingMiddleware;
