/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: access token issuance and validation
/// - [`guard`]: resolves the caller from an `Authorization` header
/// - [`policy`]: role-derived access capability
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **JWT Tokens**: HMAC signing, 30-minute expiry, no leeway
/// - **Uniform Rejection**: every credential failure looks the same to clients
/// - **Redaction**: secrets, hashes and tokens never reach `Debug` or logs
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::jwt::{JwtConfig, TokenService};
/// use taskboard_shared::auth::password::{CredentialVerifier, HashParams};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = CredentialVerifier::new(HashParams {
///     memory_kib: 1024,
///     iterations: 1,
///     parallelism: 1,
/// })?;
/// let hash = verifier.hash("user_password")?;
/// assert!(verifier.verify("user_password", &hash));
///
/// let tokens = TokenService::new(JwtConfig::new("test-secret-key-at-least-32-bytes-long"));
/// let token = tokens.issue(1)?;
/// assert!(tokens.validate(&token).is_some());
/// # Ok(())
/// # }
/// ```

pub mod guard;
pub mod jwt;
pub mod password;
pub mod policy;
