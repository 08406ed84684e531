//! Recipe-sharing website
//!
//! Visitors browse recipes by category; registered users sign in, upload
//! recipes with a photo and an ingredient list, and see their own recipes on
//! an account page.

pub mod config;
pub mod error;
pub mod ingredients;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod state;
pub mod upload;
pub mod validation;
pub mod views;

pub use config::AppConfig;
pub use routes::create_router;
pub use state::AppState;
