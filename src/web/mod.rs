//! Web server module
//!
//! Serves the search page, its JSON form and the autocomplete endpoint.

mod handlers;
mod routes;
mod state;
mod templates;
pub mod view;

pub use routes::create_router;
pub use state::AppState;
pub use templates::Templates;
