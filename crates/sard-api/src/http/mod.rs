//! HTTP routing and handlers.

pub mod routes;
pub mod state;

#[cfg(test)]
mod tests;

pub use routes::{create_router, create_router_with_body_limit, DEFAULT_BODY_LIMIT};
pub use state::AppState;
