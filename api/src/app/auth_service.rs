//! Auth service
//!
//! Handles user registration, login and bearer-token sessions.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;

use crate::domain::entities::user::{normalize_username, validate_password};
use crate::domain::entities::{NewUser, Session, User};
use crate::domain::ports::{SessionRepository, UserRepository};
use crate::error::{AppError, DomainError};

/// Same answer for unknown users and wrong passwords
const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Verified against when the user is unknown, so both failures take as long
const TIMING_DUMMY_PASSWORD: &str = "kitchenplaner-unknown-user";

/// A freshly issued login session
#[derive(Debug, Clone)]
pub struct LoginSession {
    /// Clear bearer token, only ever shown to the client once
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// Service for users and their sessions
pub struct AuthService<UR, SR>
where
    UR: UserRepository,
    SR: SessionRepository,
{
    users: Arc<UR>,
    sessions: Arc<SR>,
    session_ttl: Duration,
    dummy_hash: OnceCell<String>,
}

impl<UR, SR> AuthService<UR, SR>
where
    UR: UserRepository,
    SR: SessionRepository,
{
    pub fn new(users: Arc<UR>, sessions: Arc<SR>, session_ttl_hours: i64) -> Self {
        Self {
            users,
            sessions,
            session_ttl: Duration::hours(session_ttl_hours),
            dummy_hash: OnceCell::new(),
        }
    }

    /// Register a new user
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AppError> {
        let name = normalize_username(username)?;
        validate_password(password)?;

        if self.users.find_by_name(&name).await?.is_some() {
            return Err(DomainError::AlreadyExists(format!("User '{}' already exists", name)).into());
        }

        let user = self
            .users
            .create(&NewUser {
                name,
                password_hash: hash_password(password).await?,
            })
            .await?;

        tracing::info!("Registered user {} ({})", user.name, user.id);
        Ok(user)
    }

    /// Check the credentials and open a new session
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSession, AppError> {
        let invalid = || AppError::Domain(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()));

        let user = self.users.find_by_name(username.trim()).await?;
        let hash = match &user {
            Some(user) => self.users.get_password_hash(&user.id).await?,
            None => None,
        };

        let (user, hash) = match (user, hash) {
            (Some(user), Some(hash)) => (user, hash),
            _ => {
                verify_password(password, self.dummy_hash().await?).await?;
                return Err(invalid());
            }
        };

        if !verify_password(password, &hash).await? {
            tracing::debug!("Failed login for {}", user.name);
            return Err(invalid());
        }

        let now = Utc::now();
        let removed = self.sessions.delete_expired(now).await?;
        if removed > 0 {
            tracing::debug!("Removed {} expired sessions", removed);
        }

        let token = generate_session_token();
        let session = Session {
            token_hash: hash_token(&token),
            user_id: user.id,
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.sessions.create(&session).await?;

        Ok(LoginSession {
            token,
            user,
            expires_at: session.expires_at,
        })
    }

    /// Resolve a bearer token to its user; expired sessions are removed
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, AppError> {
        let token_hash = hash_token(token);
        let Some(session) = self.sessions.find_by_token_hash(&token_hash).await? else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            self.sessions.delete(&token_hash).await?;
            return Ok(None);
        }

        Ok(self.users.find_by_id(&session.user_id).await?)
    }

    /// End the session of a bearer token
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.sessions.delete(&hash_token(token)).await?;
        Ok(())
    }

    async fn dummy_hash(&self) -> Result<&str, DomainError> {
        self.dummy_hash
            .get_or_try_init(|| hash_password(TIMING_DUMMY_PASSWORD))
            .await
            .map(String::as_str)
    }
}

/// Hash a password with Argon2 and a random salt (PHC string format).
///
/// Runs on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String, DomainError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || argon2_hash(&password))
        .await
        .map_err(|e| DomainError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// Check a password against a stored hash on the blocking pool
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, DomainError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || argon2_verify(&password, &hash))
        .await
        .map_err(|e| DomainError::Internal(format!("Password check task failed: {}", e)))
}

fn argon2_hash(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))
}

/// Malformed hashes never verify
fn argon2_verify(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Generate a random session token
fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!("kp-{}", hex::encode(bytes))
}

/// Hash a session token for storage
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
