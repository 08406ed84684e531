//! Site models

pub mod recipe;
pub mod session;
pub mod user;

// Re-export for convenience
pub use recipe::{FoodCategory, Ingredient, NewRecipe, Recipe};
pub use session::{FlashLevel, FlashMessage, SessionRecord};
pub use user::{LoginCredentials, NewUser, User};
