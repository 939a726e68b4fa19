/// Request authentication
///
/// Turns the raw `Authorization` header into a stored [`User`]. The HTTP
/// layer calls [`authenticate`] from its middleware and injects the returned
/// user into the request.
///
/// # Rejections
///
/// Every credential problem (missing header, wrong scheme, bad token, expired
/// token, non-numeric subject, deleted user) collapses into
/// [`AuthError::Unauthenticated`] so a client cannot tell which check failed.
/// Store failures are reported separately as [`AuthError::Store`].
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::guard::{authenticate, AuthError};
/// use taskboard_shared::auth::jwt::{JwtConfig, TokenService};
/// use taskboard_shared::store::MemoryStore;
///
/// # async fn example() {
/// let store = MemoryStore::new();
/// let tokens = TokenService::new(JwtConfig::new("test-secret-key-at-least-32-bytes-long"));
///
/// let result = authenticate(&store, &tokens, Some("Basic dXNlcjpwYXNz")).await;
/// assert!(matches!(result, Err(AuthError::Unauthenticated)));
/// # }
/// ```

use super::jwt::TokenService;
use crate::models::User;
use crate::store::{Store, StoreError};

/// Message returned for every authentication failure
pub const UNAUTHENTICATED_MESSAGE: &str = "Could not validate credentials";

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Credentials missing or invalid
    #[error("Could not validate credentials")]
    Unauthenticated,

    /// User lookup failed
    #[error("Failed to resolve user: {0}")]
    Store(#[from] StoreError),
}

/// Extracts the token from an `Authorization` header value
///
/// Accepts exactly `Bearer <token>`: one space, a non-empty token, and no
/// whitespace inside the token.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?;

    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return None;
    }

    Some(token)
}

/// Resolves the caller behind an `Authorization` header
///
/// # Errors
///
/// - `AuthError::Unauthenticated` for any credential failure
/// - `AuthError::Store` if the user lookup itself fails
pub async fn authenticate(
    store: &dyn Store,
    tokens: &TokenService,
    header: Option<&str>,
) -> Result<User, AuthError> {
    let token = bearer_token(header).ok_or(AuthError::Unauthenticated)?;

    let claims = tokens.validate(token).ok_or(AuthError::Unauthenticated)?;

    let Some(user_id) = claims.user_id() else {
        tracing::debug!("Token subject is not a user id");
        return Err(AuthError::Unauthenticated);
    };

    match store.find_user(user_id).await? {
        Some(user) => Ok(user),
        None => {
            tracing::debug!(user_id, "Token subject no longer exists");
            Err(AuthError::Unauthenticated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{Claims, JwtConfig};
    use crate::models::{CreateUser, Role};
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn tokens() -> TokenService {
        TokenService::new(JwtConfig::new("test-secret-key-at-least-32-bytes-long"))
    }

    async fn store_with_user() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let user = store
            .create_user(CreateUser {
                name: "Alice".to_string(),
                email: "alice@demo.test".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Member,
            })
            .await
            .unwrap();
        (store, user)
    }

    #[test]
    fn test_bearer_token_accepts_exact_form() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_rejects_other_forms() {
        assert_eq!(bearer_token(None), None);
        assert_eq!(bearer_token(Some("")), None);
        assert_eq!(bearer_token(Some("Bearer")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(Some("bearer abc")), None);
        assert_eq!(bearer_token(Some("Bearer  abc")), None);
        assert_eq!(bearer_token(Some("Bearer abc def")), None);
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("abc")), None);
    }

    #[tokio::test]
    async fn test_authenticate_valid_token() {
        let (store, user) = store_with_user().await;
        let tokens = tokens();
        let header = format!("Bearer {}", tokens.issue(user.id).unwrap());

        let resolved = authenticate(&store, &tokens, Some(&header)).await.unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.role, Role::Member);
    }

    #[tokio::test]
    async fn test_authenticate_missing_header() {
        let (store, _) = store_with_user().await;

        let result = authenticate(&store, &tokens(), None).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_authenticate_expired_token() {
        let (store, user) = store_with_user().await;
        let tokens = tokens();
        let expired = tokens
            .sign(&Claims::new(user.id, Duration::minutes(-1)))
            .unwrap();

        let result = authenticate(&store, &tokens, Some(&format!("Bearer {}", expired))).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let (store, _) = store_with_user().await;
        let tokens = tokens();
        let header = format!("Bearer {}", tokens.issue(404).unwrap());

        let result = authenticate(&store, &tokens, Some(&header)).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_authenticate_non_numeric_subject() {
        let (store, _) = store_with_user().await;
        let tokens = tokens();
        let claims = Claims {
            sub: "alice".to_string(),
            iat: chrono::Utc::now().timestamp(),
            exp: chrono::Utc::now().timestamp() + 600,
        };
        let header = format!("Bearer {}", tokens.sign(&claims).unwrap());

        let result = authenticate(&store, &tokens, Some(&header)).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn test_unauthenticated_message_is_fixed() {
        assert_eq!(AuthError::Unauthenticated.to_string(), UNAUTHENTICATED_MESSAGE);
    }
}
