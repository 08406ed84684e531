//! Recipe model and food categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, path::Path, str::FromStr};

use crate::ingredients;

/// Fixed set of categories recipes are filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodCategory {
    FirstCourse,
    SecondCourse,
    Snack,
    Dough,
    Sweet,
    Preserve,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 6] = [
        FoodCategory::FirstCourse,
        FoodCategory::SecondCourse,
        FoodCategory::Snack,
        FoodCategory::Dough,
        FoodCategory::Sweet,
        FoodCategory::Preserve,
    ];

    /// Label stored in the `food_category` column and submitted by the form
    pub fn label(&self) -> &'static str {
        match self {
            FoodCategory::FirstCourse => "First course recipes",
            FoodCategory::SecondCourse => "Main course recipes",
            FoodCategory::Snack => "Snack recipes",
            FoodCategory::Dough => "Pastry recipes",
            FoodCategory::Sweet => "Dessert recipes",
            FoodCategory::Preserve => "Preserve recipes",
        }
    }

    /// Listing route of the category
    pub fn path(&self) -> &'static str {
        match self {
            FoodCategory::FirstCourse => "/firs_recipe/",
            FoodCategory::SecondCourse => "/second_recipe/",
            FoodCategory::Snack => "/snake/",
            FoodCategory::Dough => "/dough_recipes/",
            FoodCategory::Sweet => "/sweet_recipes/",
            FoodCategory::Preserve => "/blank_recipes/",
        }
    }
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FoodCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FoodCategory::ALL
            .into_iter()
            .find(|category| category.label() == s.trim())
            .ok_or_else(|| format!("Unknown food category: {}", s))
    }
}

/// One ingredient row of a recipe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: String,
    pub unit: String,
}

impl Ingredient {
    pub fn new(
        name: impl Into<String>,
        quantity: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            unit: unit.into(),
        }
    }
}

/// Recipe entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub dish_name: String,
    pub food_category: String,
    pub cooking_time: String,
    /// Serialized ingredient rows, see [`crate::ingredients`]
    pub ingredients: String,
    pub steps: String,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    /// Ingredient rows decoded from the stored string
    pub fn ingredient_list(&self) -> Vec<Ingredient> {
        ingredients::decode(&self.ingredients)
    }

    /// Public URL of the uploaded image
    pub fn image_url(&self) -> String {
        let file_name = Path::new(&self.image_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("/static/uploads/{}", file_name)
    }
}

/// New recipe creation payload
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub user_id: i64,
    pub dish_name: String,
    pub food_category: FoodCategory,
    pub cooking_time: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: String,
    pub image_path: String,
}
