// The http module is the inbound adapter: axum handlers and routing.

#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{build_router, AppState};
