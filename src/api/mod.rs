// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # HTTP API
//!
//! | Route | Gates |
//! |-------|-------|
//! | `GET /health` | none |
//! | `POST /api/user/register`, `POST /api/user/login` | none |
//! | `GET /api/user/info` | auth (user) |
//! | `POST /api/admin/login`, `GET /api/admin/roles` | none |
//! | `GET /api/admin/info` | auth (admin) |
//! | `POST /api/admin/create` | auth (admin) + rank (super admin) |
//! | `GET /swagger` | none |
//!
//! Every route additionally sits behind the global pipeline
//! (see [`crate::pipeline`]).

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{auth_gate, role_gate, AdminRank, AuthGate, PrincipalKind, RoleGate},
    error::ApiError,
    models::{
        AdminLoginResponse, AdminProfile, CreateAdminRequest, LoginRequest, RegisterRequest,
        RoleInfo, UserLoginResponse, UserProfile, Validate,
    },
    pipeline,
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod users;

/// Shared message for unknown usernames and wrong passwords.
pub(crate) const INVALID_CREDENTIALS: &str = "invalid username or password";

pub fn router(state: AppState) -> Router {
    let user_gate = AuthGate::new(state.tokens.clone(), PrincipalKind::User);
    let admin_gate = AuthGate::new(state.tokens.clone(), PrincipalKind::Admin);

    let user_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .merge(
            Router::new()
                .route("/info", get(users::get_user_info))
                .route_layer(from_fn_with_state(user_gate, auth_gate)),
        );

    // The last route_layer runs first: auth before rank.
    let admin_routes = Router::new()
        .route("/login", post(admin::login))
        .route("/roles", get(admin::list_roles))
        .merge(
            Router::new()
                .route("/info", get(admin::get_admin_info))
                .route_layer(from_fn_with_state(admin_gate.clone(), auth_gate)),
        )
        .merge(
            Router::new()
                .route("/create", post(admin::create_admin))
                .route_layer(from_fn_with_state(
                    RoleGate::new(AdminRank::SuperAdmin),
                    role_gate,
                ))
                .route_layer(from_fn_with_state(admin_gate, auth_gate)),
        );

    let app = Router::new()
        .route("/health", get(health::health))
        .nest("/api/user", user_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state.clone())
        .merge(SwaggerUi::new("/swagger").url("/api-doc/openapi.json", ApiDoc::openapi()));

    pipeline::apply(app, state.limiter.clone())
}

/// JSON body extractor that also runs [`Validate`].
///
/// A body that is not JSON at all (wrong content type, unreadable) is a
/// 400. A JSON body with the wrong shape or failing field rules is a
/// business error (HTTP 200, code 1).
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::MissingJsonContentType(_) | JsonRejection::BytesRejection(_) => {
                    ApiError::MalformedRequest(rejection.body_text())
                }
                other => ApiError::business(format!("invalid parameters: {}", other.body_text())),
            })?;

        value
            .validate()
            .map_err(|reason| ApiError::business(format!("invalid parameters: {reason}")))?;
        Ok(ValidJson(value))
    }
}

/// Run CPU-heavy or blocking work (password hashing, redb writes) off the
/// async workers.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("blocking task failed: {e}")))
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::register,
        users::login,
        users::get_user_info,
        admin::login,
        admin::list_roles,
        admin::get_admin_info,
        admin::create_admin
    ),
    components(
        schemas(
            health::HealthResponse,
            RegisterRequest,
            LoginRequest,
            UserProfile,
            UserLoginResponse,
            AdminProfile,
            AdminLoginResponse,
            CreateAdminRequest,
            RoleInfo
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Users", description = "End-user registration, login and profile"),
        (name = "Admin", description = "Administrator login and management")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{password, Principal, TokenCodec};
    use crate::ratelimit::{MemoryWindowStore, RateLimiter};
    use crate::storage::{AccountStore, NewAdmin, STATUS_DISABLED};
    use axum::{
        body::Body,
        http::{header, Request as HttpRequest, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const SECRET: &[u8] = b"api-test-secret-0123456789abcdef";

    struct TestApp {
        router: Router,
        state: AppState,
        _dir: tempfile::TempDir,
    }

    fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let accounts = AccountStore::open(&dir.path().join("accounts.redb")).unwrap();
        let limiter = RateLimiter::disabled(Arc::new(MemoryWindowStore::new()));
        let state = AppState::new(
            accounts,
            TokenCodec::new(SECRET),
            limiter,
            Duration::from_secs(86_400),
            Duration::from_secs(7_200),
        );
        TestApp {
            router: router(state.clone()),
            state,
            _dir: dir,
        }
    }

    fn seed_admin(app: &TestApp, username: &str, password: &str, rank: AdminRank) -> u64 {
        app.state
            .accounts
            .create_admin(NewAdmin {
                username: username.to_string(),
                password_hash: password::hash_password(password),
                rank,
            })
            .unwrap()
            .id
    }

    async fn send(app: &TestApp, request: HttpRequest<Body>) -> (StatusCode, Value) {
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value, token: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_with(uri: &str, token: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::get(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn register_alice(app: &TestApp) {
        let (status, body) = send(
            app,
            post_json(
                "/api/user/register",
                json!({"username": "alice", "password": "secret1", "email": "alice@example.com"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 0, "{body}");
    }

    async fn login(app: &TestApp, path: &str, username: &str, password: &str) -> Value {
        let (status, body) = send(
            app,
            post_json(path, json!({"username": username, "password": password}), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    #[tokio::test]
    async fn health_is_plain_ok() {
        let app = test_app();
        let (status, body) = send(&app, get_with("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn user_register_login_info_flow() {
        let app = test_app();
        register_alice(&app).await;

        let body = login(&app, "/api/user/login", "alice", "secret1").await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["user_info"]["username"], "alice");
        assert!(body["data"]["user_info"].get("password_hash").is_none());
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, get_with("/api/user/info", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["username"], "alice");
        assert_eq!(body["data"]["email"], "alice@example.com");
        assert!(!body.to_string().contains("password"));

        // Query-parameter fallback
        let (status, body) = send(&app, get_with(&format!("/api/user/info?token={token}"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "alice");
    }

    #[tokio::test]
    async fn duplicates_are_business_errors() {
        let app = test_app();
        register_alice(&app).await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/user/register",
                json!({"username": "alice", "password": "secret1", "email": "new@example.com"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 1);
        assert_eq!(body["message"], "username already exists");

        let (_, body) = send(
            &app,
            post_json(
                "/api/user/register",
                json!({"username": "alice2", "password": "secret1", "email": "ALICE@example.com"}),
                None,
            ),
        )
        .await;
        assert_eq!(body["code"], 1);
        assert_eq!(body["message"], "email already registered");
    }

    #[tokio::test]
    async fn bad_bodies() {
        let app = test_app();

        // Field rule violation
        let (status, body) = send(
            &app,
            post_json(
                "/api/user/register",
                json!({"username": "al", "password": "secret1", "email": "al@example.com"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 1);
        assert!(body["message"].as_str().unwrap().starts_with("invalid parameters"));

        // Missing field
        let (status, body) =
            send(&app, post_json("/api/user/login", json!({"username": "alice"}), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 1);

        // Not JSON at all
        let request = HttpRequest::post("/api/user/login")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("username=alice"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
    }

    #[tokio::test]
    async fn login_failures_share_one_message() {
        let app = test_app();
        register_alice(&app).await;

        let wrong_password = login(&app, "/api/user/login", "alice", "nope123").await;
        let unknown_user = login(&app, "/api/user/login", "mallory", "secret1").await;
        assert_eq!(wrong_password["code"], 1);
        assert_eq!(wrong_password["message"], INVALID_CREDENTIALS);
        assert_eq!(unknown_user["message"], INVALID_CREDENTIALS);
        assert!(wrong_password.get("data").is_none());

        seed_admin(&app, "root", "rootpass", AdminRank::SuperAdmin);
        let wrong_password = login(&app, "/api/admin/login", "root", "nope123").await;
        let unknown_admin = login(&app, "/api/admin/login", "nobody", "rootpass").await;
        assert_eq!(wrong_password["message"], INVALID_CREDENTIALS);
        assert_eq!(unknown_admin["code"], 1);
        assert_eq!(unknown_admin["message"], INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn disabled_user_cannot_log_in() {
        let app = test_app();
        register_alice(&app).await;
        let user = app.state.accounts.get_user_by_username("alice").unwrap().unwrap();
        app.state.accounts.set_user_status(user.id, STATUS_DISABLED).unwrap();

        let body = login(&app, "/api/user/login", "alice", "secret1").await;
        assert_eq!(body["code"], 1);
        assert_eq!(body["message"], "account disabled");
    }

    #[tokio::test]
    async fn gate_rejections() {
        let app = test_app();
        register_alice(&app).await;

        // No token
        let (status, body) = send(&app, get_with("/api/user/info", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"code": 401, "message": "unauthorized"}));

        // Admin token on a user route
        let admin_id = seed_admin(&app, "root", "rootpass", AdminRank::SuperAdmin);
        let admin_token = app
            .state
            .tokens
            .issue(admin_id, "root", Principal::Admin(AdminRank::SuperAdmin), Duration::from_secs(60))
            .unwrap();
        let (status, _) = send(&app, get_with("/api/user/info", Some(&admin_token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // User token on an admin route
        let user_token = app
            .state
            .tokens
            .issue(1, "alice", Principal::User, Duration::from_secs(60))
            .unwrap();
        let (status, _) = send(&app, get_with("/api/admin/info", Some(&user_token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Expired token
        let now = chrono::Utc::now().timestamp();
        let expired = app
            .state
            .tokens
            .issue_at(1, "alice", Principal::User, Duration::from_secs(60), now - 3_600)
            .unwrap();
        let (status, _) = send(&app, get_with("/api/user/info", Some(&expired))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Token signed with another secret
        let forged = TokenCodec::new(b"some-other-secret-0123456789")
            .issue(1, "alice", Principal::User, Duration::from_secs(60))
            .unwrap();
        let (status, _) = send(&app, get_with("/api/user/info", Some(&forged))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_login_info_and_create() {
        let app = test_app();
        seed_admin(&app, "root", "rootpass", AdminRank::SuperAdmin);

        let body = login(&app, "/api/admin/login", "root", "rootpass").await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["admin_info"]["role"], 1);
        let root_token = body["data"]["token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, get_with("/api/admin/info", Some(&root_token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "root");

        let (status, body) = send(
            &app,
            post_json(
                "/api/admin/create",
                json!({"username": "ops", "password": "opspass", "role": 3}),
                Some(&root_token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 0, "{body}");

        // Operator may log in but not create admins
        let body = login(&app, "/api/admin/login", "ops", "opspass").await;
        assert_eq!(body["data"]["admin_info"]["role"], 3);
        let ops_token = body["data"]["token"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            post_json(
                "/api/admin/create",
                json!({"username": "ops2", "password": "opspass", "role": 3}),
                Some(&ops_token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"code": 403, "message": "forbidden"}));
        assert!(app.state.accounts.get_admin_by_username("ops2").unwrap().is_none());

        // Unknown rank is a field error
        let (status, body) = send(
            &app,
            post_json(
                "/api/admin/create",
                json!({"username": "ops3", "password": "opspass", "role": 9}),
                Some(&root_token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 1);
    }

    #[tokio::test]
    async fn create_admin_requires_a_token() {
        let app = test_app();
        let (status, _) = send(
            &app,
            post_json(
                "/api/admin/create",
                json!({"username": "ops", "password": "opspass", "role": 3}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn roles_are_public() {
        let app = test_app();
        let (status, body) = send(&app, get_with("/api/admin/roles", None)).await;
        assert_eq!(status, StatusCode::OK);
        let values: Vec<i64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["value"].as_i64().unwrap())
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = test_app();
        let (status, body) = send(&app, get_with("/api-doc/openapi.json", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/api/admin/create").is_some());
        assert!(body["components"]["securitySchemes"].get("bearer").is_some());
    }
}
