//! Web server module
//!
//! Serves the chat page and the JSON/streaming API the page and the
//! `HttpBackend` talk to.

mod errors;
mod handlers;
pub mod models;
mod routes;
mod state;
mod templates;

pub use errors::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use templates::Templates;
