//! HTML pages rendered with maud

use axum::http::StatusCode;
use maud::{DOCTYPE, Markup, html};

use crate::{
    models::{FlashMessage, FoodCategory, Recipe, User},
    session::Session,
};

/// Chrome shared by every page: who is logged in and what to notify
pub struct Page {
    login: Option<String>,
    flashes: Vec<FlashMessage>,
}

impl Page {
    /// Collect the layout data, draining the session's pending flashes
    pub async fn new(user: Option<&User>, session: &Session) -> Self {
        Self {
            login: user.map(|user| user.login.clone()),
            flashes: session.take_flashes().await,
        }
    }

    fn layout(&self, title: &str, content: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (title) " | Recipes" }
                }
                body {
                    (self.navigation())
                    @if !self.flashes.is_empty() {
                        div.flashes {
                            @for flash in &self.flashes {
                                div class={ "flash " (flash.level.as_str()) } {
                                    strong { (flash.title) }
                                    " "
                                    span { (flash.message) }
                                }
                            }
                        }
                    }
                    main {
                        h1 { (title) }
                        (content)
                    }
                }
            }
        }
    }

    fn navigation(&self) -> Markup {
        html! {
            nav {
                a href="/" { "All recipes" }
                @for category in FoodCategory::ALL {
                    " "
                    a href=(category.path()) { (category.label()) }
                }
                div.account {
                    @match &self.login {
                        Some(login) => {
                            span { (login) }
                            " "
                            a href="/account_user/" { "My recipes" }
                            " "
                            a href="/recipe_create/" { "New recipe" }
                            " "
                            a href="/logout/" { "Log out" }
                        }
                        None => {
                            a href="/input_user/" { "Sign in" }
                            " "
                            a href="/register/" { "Register" }
                        }
                    }
                }
            }
        }
    }
}

fn recipe_cards(recipes: &[Recipe]) -> Markup {
    html! {
        @if recipes.is_empty() {
            p.empty { "No recipes yet." }
        } @else {
            ul.recipes {
                @for recipe in recipes {
                    li.recipe {
                        a href={ "/open_recept/" (recipe.id) } {
                            img src=(recipe.image_url()) alt=(recipe.dish_name) width="240";
                            h2 { (recipe.dish_name) }
                        }
                        p.meta { (recipe.food_category) " · " (recipe.cooking_time) }
                    }
                }
            }
        }
    }
}

/// Recipe listing: everything, one category, or the visitor's own
pub fn recipe_list(page: &Page, title: &str, recipes: &[Recipe]) -> Markup {
    page.layout(title, recipe_cards(recipes))
}

/// Registration form
pub fn register(page: &Page) -> Markup {
    page.layout(
        "Registration",
        html! {
            form method="post" action="/register/" {
                label { "Login " input type="text" name="login" required; }
                label { "E-mail " input type="email" name="email" required; }
                label { "Password " input type="password" name="password" required; }
                button type="submit" { "Register" }
            }
            p { "Already registered? " a href="/input_user/" { "Sign in" } }
        },
    )
}

/// Login form
pub fn login(page: &Page) -> Markup {
    page.layout(
        "Sign in",
        html! {
            form method="post" action="/input_user/" {
                label { "E-mail " input type="email" name="email" required; }
                label { "Password " input type="password" name="password" required; }
                button type="submit" { "Sign in" }
            }
            p { "No account yet? " a href="/register/" { "Register" } }
        },
    )
}

/// Account page listing the user's own recipes
pub fn account(page: &Page, user: &User, recipes: &[Recipe]) -> Markup {
    page.layout(
        &format!("Recipes of {}", user.login),
        html! {
            p { a href="/recipe_create/" { "Add a recipe" } }
            (recipe_cards(recipes))
        },
    )
}

/// Single recipe with its ingredient table
pub fn recipe_detail(page: &Page, recipe: &Recipe) -> Markup {
    page.layout(
        &recipe.dish_name,
        html! {
            img src=(recipe.image_url()) alt=(recipe.dish_name) width="480";
            p.meta {
                (recipe.food_category) " · cooking time: " (recipe.cooking_time)
            }
            h2 { "Ingredients" }
            table.ingredients {
                thead {
                    tr { th { "Ingredient" } th { "Quantity" } th { "Measure" } }
                }
                tbody {
                    @for ingredient in recipe.ingredient_list() {
                        tr {
                            td { (ingredient.name) }
                            td { (ingredient.quantity) }
                            td { (ingredient.unit) }
                        }
                    }
                }
            }
            h2 { "Preparation" }
            div.steps {
                @for line in recipe.steps.lines() {
                    p { (line) }
                }
            }
        },
    )
}

/// Number of ingredient rows offered by the creation form
const INGREDIENT_ROWS: usize = 10;

/// Recipe creation form
pub fn recipe_form(page: &Page) -> Markup {
    page.layout(
        "New recipe",
        html! {
            form method="post" action="/recipe_create/" enctype="multipart/form-data" {
                label { "Dish name " input type="text" name="dish_name" required; }
                label {
                    "Category "
                    select name="food_category" {
                        @for category in FoodCategory::ALL {
                            option value=(category.label()) { (category.label()) }
                        }
                    }
                }
                label { "Cooking time " input type="text" name="cooking_time"; }
                fieldset {
                    legend { "Ingredients" }
                    @for _ in 0..INGREDIENT_ROWS {
                        div.ingredient {
                            input type="text" name="ingredient" placeholder="Ingredient";
                            input type="text" name="quantity" placeholder="Quantity";
                            input type="text" name="measure" placeholder="Measure";
                        }
                    }
                }
                label { "Preparation " textarea name="recipe" rows="8" {} }
                label { "Photo " input type="file" name="file" accept=".png,.jpg,.jpeg,.gif"; }
                button type="submit" { "Save recipe" }
            }
        },
    )
}

/// Standalone error page, rendered without session data
pub fn error_page(status: StatusCode, message: &str) -> Markup {
    let title = status.canonical_reason().unwrap_or("Error");
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (status.as_u16()) " " (title) }
            }
            body {
                h1 { (status.as_u16()) " " (title) }
                p { (message) }
                p { a href="/" { "Back to all recipes" } }
            }
        }
    }
}
