//! Integration tests for the shop.
//!
//! Each test spawns the full router on an ephemeral port, backed by the
//! in-process store and in-memory sessions, and drives it over HTTP with
//! `reqwest`. No database or external service is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopapp-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use reqwest::{Client, Response, redirect};
use tower_sessions::MemoryStore;

use shopapp::db::MemoryDatabase;
use shopapp::middleware::session_layer;
use shopapp::models::{Group, User};
use shopapp::ports::{GroupRepository, Repositories};
use shopapp::routes;
use shopapp::services::AuthService;
use shopapp::state::AppState;
use shopapp_core::PermissionCode;

/// Password given to every test account.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// A running shop server plus direct access to its store.
pub struct TestApp {
    pub base_url: String,
    pub db: Arc<MemoryDatabase>,
}

impl TestApp {
    /// Start a server on `127.0.0.1` with an empty store.
    pub async fn spawn() -> Self {
        let db = Arc::new(MemoryDatabase::new());
        let state = AppState::new(Repositories::in_memory(&db));
        let app = routes::app(state, session_layer(MemoryStore::default(), false));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            db,
        }
    }

    /// Absolute URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A fresh client with its own cookie jar that does not follow redirects.
    #[must_use]
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .unwrap()
    }

    /// Register an account with [`TEST_PASSWORD`].
    pub async fn create_user(&self, username: &str, superuser: bool) -> User {
        AuthService::new(self.db.as_ref())
            .register(username, TEST_PASSWORD, superuser)
            .await
            .unwrap()
    }

    /// Create a group holding the given permissions.
    pub async fn create_group(&self, name: &str, permissions: &[&str]) -> Group {
        let group = GroupRepository::create(self.db.as_ref(), name).await.unwrap();
        for code in permissions {
            let code = PermissionCode::parse(code).unwrap();
            GroupRepository::grant_permission(self.db.as_ref(), group.id, &code)
                .await
                .unwrap();
        }
        group
    }

    /// Submit the login form.
    pub async fn login(&self, client: &Client, username: &str, password: &str) -> Response {
        client
            .post(self.url("/accounts/login/"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .unwrap()
    }

    /// A client already logged in as a new account.
    pub async fn logged_in_client(&self, username: &str, superuser: bool) -> (Client, User) {
        let user = self.create_user(username, superuser).await;
        let client = self.client();
        let response = self.login(&client, username, TEST_PASSWORD).await;
        assert_eq!(response.status(), 303, "login failed for {username}");
        (client, user)
    }

    /// GET a path.
    pub async fn get(&self, client: &Client, path: &str) -> Response {
        client.get(self.url(path)).send().await.unwrap()
    }

    /// POST form pairs to a path.
    pub async fn post_form(&self, client: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        client.post(self.url(path)).form(form).send().await.unwrap()
    }
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
