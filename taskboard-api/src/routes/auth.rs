/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/login` - Exchange email and password for an access token
///
/// There is no registration or refresh: users are provisioned out of band
/// and log in again once their token expires.

use crate::{
    app::AppState,
    error::{validation_errors, ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Login request
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login response
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed access token
    pub access_token: String,

    /// Always `bearer`
    pub token_type: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Login endpoint
///
/// Authenticates a user and returns an access token.
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// {
///   "email": "alice@demo.test",
///   "password": "password123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "token_type": "bearer"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON
/// - `401 Unauthorized`: Unknown email or wrong password
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;
    req.validate().map_err(validation_errors)?;

    let user = state.store.find_user_by_email(&req.email).await?;

    // Argon2 is CPU-bound; keep it off the async workers. Unknown emails are
    // checked against a decoy hash so both failures cost the same.
    let credentials = state.credentials.clone();
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let valid = tokio::task::spawn_blocking(move || {
        credentials.verify_account(&req.password, stored_hash.as_deref())
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("Password check panicked: {}", e)))?;

    let user = match user {
        Some(user) if valid => user,
        Some(user) => {
            tracing::info!(user_id = user.id, "Login failed: wrong password");
            return Err(ApiError::Unauthorized);
        }
        None => {
            tracing::info!("Login failed: unknown email");
            return Err(ApiError::Unauthorized);
        }
    };

    let access_token = state.tokens.issue(user.id)?;
    tracing::info!(user_id = user.id, role = user.role.as_str(), "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_debug_redacts_password() {
        let req = LoginRequest {
            email: "alice@demo.test".to_string(),
            password: "password123".to_string(),
        };

        let rendered = format!("{:?}", req);
        assert!(rendered.contains("alice@demo.test"));
        assert!(!rendered.contains("password123"));
    }

    #[test]
    fn test_login_request_validation() {
        let bad_email = LoginRequest {
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let empty_password = LoginRequest {
            email: "alice@demo.test".to_string(),
            password: String::new(),
        };
        assert!(empty_password.validate().is_err());
    }

    #[test]
    fn test_login_response_debug_redacts_token() {
        let response = LoginResponse {
            access_token: "eyJhbGciOiJIUzI1NiJ9.secret.sig".to_string(),
            token_type: "bearer".to_string(),
        };
        assert!(!format!("{:?}", response).contains("eyJ"));
    }
}
