//! Router-level tests driving the site through `tower::ServiceExt::oneshot`

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use common::database::{DatabaseConfig, init_pool, run_migrations};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use web::{
    AppConfig, AppState, create_router,
    models::{FoodCategory, Ingredient, NewRecipe},
    repositories::{RecipeRepository, UserRepository},
    session::SESSION_COOKIE,
};

const BOUNDARY: &str = "recipe-form-boundary";

struct TestApp {
    router: Router,
    pool: SqlitePool,
    uploads: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    async fn with_config(config: AppConfig) -> Self {
        let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let uploads = TempDir::new().unwrap();
        let config = AppConfig {
            upload_dir: uploads.path().to_path_buf(),
            ..config
        };
        let router = create_router(AppState::new(pool.clone(), config));
        Self {
            router,
            pool,
            uploads,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn post_recipe(&self, body: Vec<u8>, cookie: &str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri("/recipe_create/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::COOKIE, cookie)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Register and sign in, returning the session cookie
    async fn signed_in(&self) -> String {
        let response = self
            .post_form(
                "/register/",
                "login=abc12&email=a%40b.co&password=abc12",
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = self
            .post_form("/input_user/", "email=a%40b.co&password=abc12", None)
            .await;
        assert_eq!(location(&response), "/account_user/");
        session_cookie(&response).expect("login sets the session cookie")
    }

    fn uploaded_files(&self) -> Vec<String> {
        std::fs::read_dir(self.uploads.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(SESSION_COOKIE))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn multipart_body(fields: &[(&str, &str)], file: (&str, &[u8])) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    let (file_name, data) = file;
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn borscht_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("dish_name", "Borscht"),
        ("food_category", "First course recipes"),
        ("cooking_time", "2 hours"),
        ("ingredient", "Beetroot"),
        ("quantity", "2"),
        ("measure", "pcs"),
        ("ingredient", "Sour cream, thick"),
        ("quantity", "100"),
        ("measure", "g"),
        ("ingredient", ""),
        ("quantity", ""),
        ("measure", ""),
        ("recipe", "Boil the beets.\nServe hot."),
    ]
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn test_registration_succeeds_then_rejects_the_same_login() {
    let app = TestApp::new().await;
    let form = "login=abc12&email=a%40b.co&password=abc12";

    let response = app.post_form("/register/", form, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/input_user/");
    let cookie = session_cookie(&response).unwrap();

    let login_page = body_text(app.get("/input_user/", Some(&cookie)).await).await;
    assert!(login_page.contains("You have successfully registered"));

    let response = app.post_form("/register/", form, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Such a user already exists"));
}

#[tokio::test]
async fn test_registration_rejects_bad_formats() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/register/", "login=ab&email=a%40b.co&password=abc12", None)
        .await;
    assert!(body_text(response).await.contains("Login must consist"));

    let response = app
        .post_form("/register/", "login=abc12&email=a%40b.co&password=abc", None)
        .await;
    assert!(body_text(response).await.contains("Password must consist"));

    let users = UserRepository::new(app.pool.clone());
    assert!(users.find_by_login("abc12").await.unwrap().is_none());
}

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    let app = TestApp::new().await;

    for uri in ["/account_user/", "/recipe_create/", "/open_recept/1", "/logout/"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/input_user/", "{uri}");
    }
}

#[tokio::test]
async fn test_wrong_password_is_reported() {
    let app = TestApp::new().await;
    app.signed_in().await;

    let response = app
        .post_form("/input_user/", "email=a%40b.co&password=wrong1", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("We could not find such a user"));
}

#[tokio::test]
async fn test_create_recipe_stores_file_and_ingredients() {
    let app = TestApp::new().await;
    let cookie = app.signed_in().await;

    let account = body_text(app.get("/account_user/", Some(&cookie)).await).await;
    assert!(account.contains("Welcome"));

    let body = multipart_body(&borscht_fields(), ("soup.png", b"\x89PNG\r\n"));
    let response = app.post_recipe(body, &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/account_user/");

    let files = app.uploaded_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("_soup.png"));

    let recipes = RecipeRepository::new(app.pool.clone()).list_all().await.unwrap();
    assert_eq!(recipes.len(), 1);
    let recipe = &recipes[0];
    assert_eq!(recipe.food_category, "First course recipes");
    assert_eq!(
        recipe.ingredient_list(),
        vec![
            Ingredient::new("Beetroot", "2", "pcs"),
            Ingredient::new("Sour cream, thick", "100", "g"),
        ]
    );

    let detail = app
        .get(&format!("/open_recept/{}", recipe.id), Some(&cookie))
        .await;
    assert_eq!(detail.status(), StatusCode::OK);
    let detail = body_text(detail).await;
    assert!(detail.contains("Sour cream, thick"));
    assert!(detail.contains(&format!("/static/uploads/{}", files[0])));

    let image = app
        .get(&format!("/static/uploads/{}", files[0]), None)
        .await;
    assert_eq!(image.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_disallowed_extension_is_rejected() {
    let app = TestApp::new().await;
    let cookie = app.signed_in().await;

    let body = multipart_body(&borscht_fields(), ("notes.txt", b"not an image"));
    let response = app.post_recipe(body, &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/recipe_create/");

    assert!(app.uploaded_files().is_empty());
    let recipes = RecipeRepository::new(app.pool.clone()).list_all().await.unwrap();
    assert!(recipes.is_empty());

    let form = body_text(app.get("/recipe_create/", Some(&cookie)).await).await;
    assert!(form.contains("Only png, jpg, jpeg and gif images can be uploaded"));
}

#[tokio::test]
async fn test_missing_file_is_rejected() {
    let app = TestApp::new().await;
    let cookie = app.signed_in().await;

    let body = multipart_body(&borscht_fields(), ("", b""));
    let response = app.post_recipe(body, &cookie).await;
    assert_eq!(location(&response), "/recipe_create/");

    let form = body_text(app.get("/recipe_create/", Some(&cookie)).await).await;
    assert!(form.contains("You did not select a file"));
}

#[tokio::test]
async fn test_unknown_category_is_rejected() {
    let app = TestApp::new().await;
    let cookie = app.signed_in().await;

    let mut fields = borscht_fields();
    fields[1] = ("food_category", "Soups");
    let response = app
        .post_recipe(multipart_body(&fields, ("soup.png", b"png")), &cookie)
        .await;
    assert_eq!(location(&response), "/recipe_create/");
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn test_oversized_upload_is_refused() {
    let app = TestApp::with_config(AppConfig {
        max_upload_bytes: 4096,
        ..AppConfig::default()
    })
    .await;
    let cookie = app.signed_in().await;

    let image = vec![0u8; 16 * 1024];
    let response = app
        .post_recipe(multipart_body(&borscht_fields(), ("big.png", image.as_slice())), &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn test_category_pages_filter_recipes() {
    let app = TestApp::new().await;
    app.signed_in().await;

    let user = UserRepository::new(app.pool.clone())
        .find_by_email("a@b.co")
        .await
        .unwrap()
        .unwrap();
    RecipeRepository::new(app.pool.clone())
        .create(&NewRecipe {
            user_id: user.id,
            dish_name: "Apple pie".to_string(),
            food_category: FoodCategory::Dough,
            cooking_time: "1 hour".to_string(),
            ingredients: vec![Ingredient::new("Apple", "3", "pcs")],
            steps: "Bake.".to_string(),
            image_path: "static/uploads/20240101120000_pie.png".to_string(),
        })
        .await
        .unwrap();

    let dough = body_text(app.get("/dough_recipes/", None).await).await;
    assert!(dough.contains("Apple pie"));

    let snacks = body_text(app.get("/snake/", None).await).await;
    assert!(!snacks.contains("Apple pie"));

    for uri in ["/", "/index/"] {
        assert!(body_text(app.get(uri, None).await).await.contains("Apple pie"));
    }
}

#[tokio::test]
async fn test_unknown_recipe_is_not_found() {
    let app = TestApp::new().await;
    let cookie = app.signed_in().await;

    let response = app.get("/open_recept/999", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_ends_the_login() {
    let app = TestApp::new().await;
    let cookie = app.signed_in().await;

    let response = app.get("/logout/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let index = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(index.contains("You have logged out of your account"));

    let response = app.get("/account_user/", Some(&cookie)).await;
    assert_eq!(location(&response), "/input_user/");
}
