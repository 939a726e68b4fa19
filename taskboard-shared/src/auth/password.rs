/// Password hashing module using Argon2id
///
/// Passwords are hashed with Argon2id and a fresh random salt, stored in PHC
/// string format (algorithm, parameters, salt and hash in one string).
///
/// # Security
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB) by default
/// - **Iterations**: 3 passes by default
/// - **Parallelism**: 4 lanes by default
/// - **Output**: 32-byte hash
///
/// Verification reads the parameters back from the stored hash, so changing
/// the cost configuration never invalidates existing hashes.
///
/// Logins for unknown accounts are checked against a decoy hash with the
/// configured cost (see [`CredentialVerifier::verify_account`]), so they take
/// as long as a wrong password.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::CredentialVerifier;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = CredentialVerifier::default();
/// let hash = verifier.hash("super_secret_password_123")?;
///
/// assert!(verifier.verify("super_secret_password_123", &hash));
/// assert!(!verifier.verify("wrong_password", &hash));
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Cost parameters rejected by Argon2
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MB
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Hashes and verifies user passwords
///
/// Holds a configured Argon2id instance; cheap to share behind an `Arc`.
#[derive(Clone)]
pub struct CredentialVerifier {
    argon2: Argon2<'static>,
    decoy: String,
}

const DECOY_PASSWORD: &str = "taskboard-decoy-password";

impl CredentialVerifier {
    /// Creates a verifier with the given cost parameters
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidParams` if Argon2 rejects the parameters
    /// (e.g. memory below 8 KiB per lane).
    pub fn new(params: HashParams) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(params.memory_kib)
            .t_cost(params.iterations)
            .p_cost(params.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        let mut verifier = Self::with_argon2_params(params);
        verifier.decoy = verifier.hash(DECOY_PASSWORD)?;
        Ok(verifier)
    }

    fn with_argon2_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params),
            decoy: String::new(),
        }
    }

    /// Hashes a password with a fresh random salt
    ///
    /// Returns a PHC string, e.g.
    /// `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if hashing fails
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    /// Verifies a password against a stored hash
    ///
    /// Comparison is constant-time (inside Argon2). A malformed stored hash is
    /// treated as a non-match rather than an error.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let parsed_hash = match PasswordHash::new(stored) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Verifies a login attempt for an account that may not exist
    ///
    /// With no stored hash the password is still run through Argon2 against
    /// the decoy hash, then rejected.
    pub fn verify_account(&self, password: &str, stored: Option<&str>) -> bool {
        match stored {
            Some(hash) => self.verify(password, hash),
            None => {
                let _ = self.verify(password, &self.decoy);
                false
            }
        }
    }
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        let mut verifier = Self::with_argon2_params(
            ParamsBuilder::new()
                .m_cost(65536)
                .t_cost(3)
                .p_cost(4)
                .output_len(32)
                .build()
                .unwrap_or_default(),
        );
        verifier.decoy = verifier.hash(DECOY_PASSWORD).unwrap_or_default();
        verifier
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier").finish_non_exhaustive()
    }
}
