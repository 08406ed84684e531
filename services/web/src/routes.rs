//! Site routes

use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Local;
use maud::Markup;
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    ingredients,
    middleware::{CurrentUser, LOGIN_PATH, MaybeUser, session_middleware},
    models::{FlashMessage, FoodCategory, LoginCredentials, NewRecipe, NewUser, User},
    session::Session,
    state::AppState,
    upload,
    validation::{RegistrationError, check_new_user},
    views::{self, Page},
};

const ACCOUNT_PATH: &str = "/account_user/";
const RECIPE_CREATE_PATH: &str = "/recipe_create/";

/// Create the router for the site
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/", get(index))
        .route("/index/", get(index))
        .route("/register/", get(register_form).post(register))
        .route("/input_user/", get(login_form).post(login))
        .route("/account_user/", get(account))
        .route("/open_recept/:id", get(open_recipe))
        .route("/recipe_create/", get(recipe_form).post(recipe_create))
        .route("/logout/", get(logout));

    for category in FoodCategory::ALL {
        router = router.route(
            category.path(),
            get(
                move |State(state): State<AppState>, MaybeUser(user): MaybeUser, session: Session| async move {
                    category_recipes(state, user, session, category).await
                },
            ),
        );
    }

    router
        .nest_service("/static/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match common::database::health_check(&state.db_pool).await {
        Ok(true) => "ok",
        Ok(false) | Err(_) => "unavailable",
    };

    Json(json!({
        "status": "ok",
        "service": "web",
        "database": database
    }))
}

/// All recipes
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    session: Session,
) -> AppResult<Markup> {
    let recipes = state.recipe_repository.list_all().await?;
    let page = Page::new(user.as_ref(), &session).await;
    Ok(views::recipe_list(&page, "All recipes", &recipes))
}

async fn category_recipes(
    state: AppState,
    user: Option<User>,
    session: Session,
    category: FoodCategory,
) -> AppResult<Markup> {
    let recipes = state.recipe_repository.list_by_category(category).await?;
    let page = Page::new(user.as_ref(), &session).await;
    Ok(views::recipe_list(&page, category.label(), &recipes))
}

/// Registration form
pub async fn register_form(MaybeUser(user): MaybeUser, session: Session) -> Markup {
    views::register(&Page::new(user.as_ref(), &session).await)
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    session: Session,
    Form(new_user): Form<NewUser>,
) -> AppResult<Response> {
    match check_new_user(&state.user_repository, &new_user).await {
        Ok(()) => {
            let created = state.user_repository.create(&new_user).await?;
            info!("Registered user {} ({})", created.login, created.id);
            session
                .flash(FlashMessage::success(
                    "You have successfully registered, sign in to your account",
                ))
                .await;
            Ok(Redirect::to(LOGIN_PATH).into_response())
        }
        Err(RegistrationError::Storage(e)) => Err(AppError::Internal(e)),
        Err(rejection) => {
            warn!("Registration of '{}' refused: {}", new_user.login, rejection);
            session.flash(FlashMessage::error(rejection.to_string())).await;
            let page = Page::new(user.as_ref(), &session).await;
            Ok(views::register(&page).into_response())
        }
    }
}

/// Login form
pub async fn login_form(MaybeUser(user): MaybeUser, session: Session) -> Markup {
    views::login(&Page::new(user.as_ref(), &session).await)
}

/// Authenticate with e-mail and password
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(credentials): Form<LoginCredentials>,
) -> AppResult<Response> {
    let user = state.user_repository.find_by_email(&credentials.email).await?;

    if let Some(user) = user {
        if state
            .user_repository
            .verify_password(&user, &credentials.password)?
        {
            info!("User {} logged in", user.login);
            session.login(user.id).await;
            session.flash(FlashMessage::success("Welcome")).await;
            return Ok(Redirect::to(ACCOUNT_PATH).into_response());
        }
    }

    warn!("Failed login for {}", credentials.email);
    session
        .flash(FlashMessage::error("We could not find such a user"))
        .await;
    let page = Page::new(None, &session).await;
    Ok(views::login(&page).into_response())
}

/// The logged-in user's own recipes
pub async fn account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
) -> AppResult<Markup> {
    let recipes = state.recipe_repository.list_by_user(user.id).await?;
    let page = Page::new(Some(&user), &session).await;
    Ok(views::account(&page, &user, &recipes))
}

/// One recipe
pub async fn open_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    Path(id): Path<i64>,
) -> AppResult<Markup> {
    let recipe = state
        .recipe_repository
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;
    let page = Page::new(Some(&user), &session).await;
    Ok(views::recipe_detail(&page, &recipe))
}

/// Recipe creation form
pub async fn recipe_form(CurrentUser(user): CurrentUser, session: Session) -> Markup {
    views::recipe_form(&Page::new(Some(&user), &session).await)
}

/// Fields of the multipart recipe form
#[derive(Debug, Default)]
struct RecipeForm {
    dish_name: String,
    food_category: String,
    cooking_time: String,
    ingredient: Vec<String>,
    quantity: Vec<String>,
    measure: Vec<String>,
    recipe: String,
    file_name: String,
    file_data: Bytes,
}

impl RecipeForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = RecipeForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match name.as_str() {
                "file" => {
                    form.file_name = field.file_name().unwrap_or_default().to_owned();
                    form.file_data = field.bytes().await?;
                }
                "dish_name" => form.dish_name = field.text().await?,
                "food_category" => form.food_category = field.text().await?,
                "cooking_time" => form.cooking_time = field.text().await?,
                "ingredient" => form.ingredient.push(field.text().await?),
                "quantity" => form.quantity.push(field.text().await?),
                "measure" => form.measure.push(field.text().await?),
                "recipe" => form.recipe = field.text().await?,
                _ => {}
            }
        }

        Ok(form)
    }
}

async fn back_to_recipe_form(session: &Session, message: String) -> Response {
    warn!("Recipe rejected: {}", message);
    session.flash(FlashMessage::error(message)).await;
    Redirect::to(RECIPE_CREATE_PATH).into_response()
}

/// Store an uploaded recipe
///
/// The image is written before the row is inserted and removed again if the
/// insert fails.
pub async fn recipe_create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = RecipeForm::read(multipart).await?;

    if let Err(rejection) = upload::check_image_name(&form.file_name) {
        return Ok(back_to_recipe_form(&session, rejection.to_string()).await);
    }
    let food_category = match form.food_category.parse::<FoodCategory>() {
        Ok(category) => category,
        Err(e) => return Ok(back_to_recipe_form(&session, e).await),
    };
    let dish_name = form.dish_name.trim();
    if dish_name.is_empty() {
        return Ok(back_to_recipe_form(&session, "Enter the name of the dish".to_string()).await);
    }

    let path = upload::save_image(
        &state.config.upload_dir,
        &form.file_name,
        &form.file_data,
        Local::now(),
    )
    .await?;

    let new_recipe = NewRecipe {
        user_id: user.id,
        dish_name: dish_name.to_string(),
        food_category,
        cooking_time: form.cooking_time.trim().to_string(),
        ingredients: ingredients::from_form_rows(&form.ingredient, &form.quantity, &form.measure),
        steps: form.recipe,
        image_path: path.to_string_lossy().into_owned(),
    };

    match state.recipe_repository.create(&new_recipe).await {
        Ok(recipe) => {
            info!("User {} created recipe {}", user.login, recipe.id);
            Ok(Redirect::to(ACCOUNT_PATH).into_response())
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                warn!("Could not remove orphaned upload {}: {}", path.display(), cleanup);
            }
            Err(AppError::Internal(e))
        }
    }
}

/// End the session's login and go back to the start page
pub async fn logout(CurrentUser(user): CurrentUser, session: Session) -> Redirect {
    info!("User {} logged out", user.login);
    session
        .flash(FlashMessage::success("You have logged out of your account"))
        .await;
    session.logout().await;
    Redirect::to("/")
}
