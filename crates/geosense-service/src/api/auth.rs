//! Authenticator HTTP API.
//!
//! Two routes: `POST /login` exchanges credentials for a signed token, and
//! `POST /register` (ADMIN only) creates a new credential. Registration is
//! gated by the same token middleware the sensor service uses, so only a
//! logged-in admin can mint new accounts.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use geosense_auth::Authenticator;
use geosense_types::Role;

use crate::api::ApiError;
use crate::middleware::{TokenVerifier, require_admin};

/// Shared state for the authenticator router.
#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Arc<Authenticator>,
    pub verifier: Arc<TokenVerifier>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Parsed by hand so an unknown role is a 400, not a decode failure.
    pub role: String,
}

/// Build the authenticator router.
pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route_layer(from_fn_with_state(state.verifier.clone(), require_admin))
        .route("/login", post(login))
        .with_state(state)
}

async fn login(
    State(state): State<AuthState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .authenticator
        .login(&req.username, &req.password)
        .await?;
    info!(username = %req.username, "login succeeded");
    Ok(Json(TokenResponse { token }))
}

async fn register(
    State(state): State<AuthState>,
    Json(req): Json<RegisterRequest>,
) -> Result<StatusCode, ApiError> {
    let role = Role::from_str(&req.role)
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;
    state
        .authenticator
        .register(&req.username, &req.password, role)
        .await?;
    info!(username = %req.username, %role, "credential registered");
    Ok(StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, header::AUTHORIZATION},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use time::Duration;
    use tower::ServiceExt;

    use geosense_auth::testkeys;
    use geosense_store::memory::MemoryCredentialStore;

    async fn router() -> Router {
        let authenticator = Arc::new(
            Authenticator::new(
                Arc::new(MemoryCredentialStore::new()),
                testkeys::PRIVATE_KEY_PEM.as_bytes(),
                Duration::hours(1),
            )
            .unwrap(),
        );
        authenticator
            .register("root", "1234", Role::Admin)
            .await
            .unwrap();
        authenticator
            .register("bob", "hunter2", Role::User)
            .await
            .unwrap();

        let verifier = Arc::new(TokenVerifier::new(testkeys::PUBLIC_KEY_PEM.as_bytes()).unwrap());
        auth_router(AuthState {
            authenticator,
            verifier,
        })
    }

    fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("token {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login_token(router: &Router, username: &str, password: &str) -> String {
        let response = router
            .clone()
            .oneshot(post_json(
                "/login",
                json!({"username": username, "password": password}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_login_returns_verifiable_token() {
        let router = router().await;
        let token = login_token(&router, "root", "1234").await;

        let key =
            geosense_auth::token::decoding_key_from_pem(testkeys::PUBLIC_KEY_PEM.as_bytes())
                .unwrap();
        let claims = geosense_auth::token::parse(&token, &key).unwrap();
        assert_eq!(claims.username, "root");
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_user_identically() {
        let router = router().await;

        let mut messages = Vec::new();
        for (user, pass) in [("root", "wrong"), ("nobody", "1234")] {
            let response = router
                .clone()
                .oneshot(post_json(
                    "/login",
                    json!({"username": user, "password": pass}),
                    None,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            messages.push(body_json(response).await["message"].clone());
        }
        assert_eq!(messages[0], messages[1]);
    }

    #[tokio::test]
    async fn test_register_requires_admin_token() {
        let router = router().await;
        let body = json!({"username": "carol", "password": "pw", "role": "USER"});

        let response = router
            .clone()
            .oneshot(post_json("/register", body.clone(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let user_token = login_token(&router, "bob", "hunter2").await;
        let response = router
            .clone()
            .oneshot(post_json("/register", body.clone(), Some(&user_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let admin_token = login_token(&router, "root", "1234").await;
        let response = router
            .clone()
            .oneshot(post_json("/register", body, Some(&admin_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // The freshly registered user can log in.
        login_token(&router, "carol", "pw").await;
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_role() {
        let router = router().await;
        let admin_token = login_token(&router, "root", "1234").await;

        let response = router
            .clone()
            .oneshot(post_json(
                "/register",
                json!({"username": "carol", "password": "pw", "role": "SUPERUSER"}),
                Some(&admin_token),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let router = router().await;
        let admin_token = login_token(&router, "root", "1234").await;

        let response = router
            .clone()
            .oneshot(post_json(
                "/register",
                json!({"username": "bob", "password": "other", "role": "USER"}),
                Some(&admin_token),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(response).await["message"],
            "username already taken"
        );
    }
}
