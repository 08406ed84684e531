//! Repositories for database operations

pub mod recipe;
pub mod session;
pub mod user;

pub use recipe::RecipeRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
