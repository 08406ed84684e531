//! Recipe repository for database operations

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    ingredients,
    models::{FoodCategory, NewRecipe, Recipe},
};

const RECIPE_COLUMNS: &str = "id, user_id, dish_name, food_category, cooking_time, ingredients, steps, image_path, created_at";

/// Recipe repository for database operations
#[derive(Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    /// Create a new recipe repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a recipe whose image has already been written to disk
    pub async fn create(&self, new_recipe: &NewRecipe) -> Result<Recipe> {
        info!(
            "Creating recipe '{}' for user {}",
            new_recipe.dish_name, new_recipe.user_id
        );

        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "INSERT INTO recipes (user_id, dish_name, food_category, cooking_time, ingredients, steps, image_path, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(new_recipe.user_id)
        .bind(&new_recipe.dish_name)
        .bind(new_recipe.food_category.label())
        .bind(&new_recipe.cooking_time)
        .bind(ingredients::encode(&new_recipe.ingredients))
        .bind(&new_recipe.steps)
        .bind(&new_recipe.image_path)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(recipe)
    }

    /// Get all recipes, newest first
    pub async fn list_all(&self) -> Result<Vec<Recipe>> {
        let recipes = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(recipes)
    }

    /// Get the recipes of one category, newest first
    pub async fn list_by_category(&self, category: FoodCategory) -> Result<Vec<Recipe>> {
        let recipes = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE food_category = ? ORDER BY id DESC"
        ))
        .bind(category.label())
        .fetch_all(&self.pool)
        .await?;

        Ok(recipes)
    }

    /// Get the recipes owned by a user, newest first
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Recipe>> {
        let recipes = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = ? ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(recipes)
    }

    /// Find a recipe by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Ingredient, NewUser},
        repositories::UserRepository,
    };
    use common::database::{DatabaseConfig, init_pool, run_migrations};

    async fn setup() -> (RecipeRepository, i64) {
        let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let user = UserRepository::new(pool.clone())
            .create(&NewUser {
                login: "chef1".to_string(),
                email: "chef@kitchen.io".to_string(),
                password: "chef1".to_string(),
            })
            .await
            .unwrap();
        (RecipeRepository::new(pool), user.id)
    }

    fn recipe(user_id: i64, dish_name: &str, food_category: FoodCategory) -> NewRecipe {
        NewRecipe {
            user_id,
            dish_name: dish_name.to_string(),
            food_category,
            cooking_time: "40 min".to_string(),
            ingredients: vec![
                Ingredient::new("Flour", "200", "g"),
                Ingredient::new("Milk", "0,3", "l"),
            ],
            steps: "Mix and bake.".to_string(),
            image_path: "static/uploads/20240101120000_pie.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (recipes, user_id) = setup().await;
        let created = recipes
            .create(&recipe(user_id, "Pie", FoodCategory::Dough))
            .await
            .unwrap();

        let found = recipes.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.dish_name, "Pie");
        assert_eq!(found.food_category, "Pastry recipes");
        assert_eq!(found.ingredient_list().len(), 2);
        assert_eq!(found.ingredient_list()[1], Ingredient::new("Milk", "0,3", "l"));

        assert!(recipes.find_by_id(created.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_filters() {
        let (recipes, user_id) = setup().await;
        recipes
            .create(&recipe(user_id, "Borscht", FoodCategory::FirstCourse))
            .await
            .unwrap();
        recipes
            .create(&recipe(user_id, "Jam", FoodCategory::Preserve))
            .await
            .unwrap();
        recipes
            .create(&recipe(user_id, "Solyanka", FoodCategory::FirstCourse))
            .await
            .unwrap();

        let all = recipes.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].dish_name, "Solyanka");

        let soups = recipes
            .list_by_category(FoodCategory::FirstCourse)
            .await
            .unwrap();
        assert_eq!(soups.len(), 2);

        assert!(
            recipes
                .list_by_category(FoodCategory::Sweet)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(recipes.list_by_user(user_id).await.unwrap().len(), 3);
        assert!(recipes.list_by_user(user_id + 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_owner_is_rejected() {
        let (recipes, user_id) = setup().await;
        let result = recipes
            .create(&recipe(user_id + 42, "Ghost soup", FoodCategory::FirstCourse))
            .await;
        assert!(result.is_err());
    }
}
