//! Login and request authentication
//!
//! Login verifies credentials against the directory, then checks the
//! application user account and issues a signed JWT. The middleware
//! verifies the bearer token on every other route, re-checks the account,
//! gates write methods on role, and injects the actor the write path
//! threads through to the audit trail.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Method},
    middleware::Next,
    response::Response,
};
use header_hub_core::User;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{extract::AppJson, ApiError, AppState};

const TOKEN_PREFIX: &str = "Bearer ";

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Issues and verifies HMAC-signed tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: jsonwebtoken::EncodingKey,
    decoding_key: jsonwebtoken::DecodingKey,
    validation: jsonwebtoken::Validation,
    expire_secs: i64,
}

impl JwtService {
    pub fn new(secret: &str, expire_secs: i64) -> Self {
        Self {
            encoding_key: jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
            validation: jsonwebtoken::Validation::default(),
            expire_secs,
        }
    }

    /// Issue a signed token for a username.
    pub fn issue(&self, username: &str) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_owned(),
            iat: now,
            exp: now + self.expire_secs,
        };
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify a token and extract the username.
    pub fn verify(&self, token: &str) -> Result<String, ApiError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|_| ApiError::Authentication("Invalid or expired token".to_owned()))
    }
}

/// The authenticated principal, injected as a request extension.
#[derive(Debug, Clone)]
pub struct Actor(pub String);

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

/// Handle `POST /login`.
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<axum::Json<LoginResponse>, ApiError> {
    let directory = state.open_directory().await?;
    if !directory
        .authenticate(&request.username, &request.password)
        .await?
    {
        return Err(ApiError::Authentication(
            "Username or password is wrong!".to_owned(),
        ));
    }

    let user = check_user(&state, &request.username).await?;
    let token = state.jwt.issue(&user.username)?;
    Ok(axum::Json(LoginResponse { user, token }))
}

/// Require a valid bearer token; write methods additionally require a
/// writing role.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let Some(token) = header.strip_prefix(TOKEN_PREFIX) else {
        return Err(ApiError::Authentication(
            "Missing or invalid authorization header".to_owned(),
        ));
    };

    let username = state.jwt.verify(token)?;
    let user = check_user(&state, &username).await?;

    let writes = matches!(
        *request.method(),
        Method::POST | Method::PUT | Method::DELETE
    );
    if writes && !user.role.can_write() {
        return Err(ApiError::Authorization(format!(
            "User with name '{username}' does not have write access"
        )));
    }

    request.extensions_mut().insert(Actor(username));
    Ok(next.run(request).await)
}

/// The account must exist and be enabled.
async fn check_user(state: &AppState, username: &str) -> Result<User, ApiError> {
    let user = state
        .users
        .find_by_username(username)
        .await?
        .ok_or_else(|| {
            ApiError::Authentication(format!("User with name '{username}' not found"))
        })?;
    if !user.enabled {
        return Err(ApiError::Authorization(format!(
            "User with name '{username}' is disabled"
        )));
    }
    Ok(user)
}
