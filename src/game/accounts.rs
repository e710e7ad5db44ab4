use super::{GameError, GameResult};
use crate::db::user::UserRepository;
use crate::db::DbError;
use crate::models::{NewUser, User, UserStatus};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::SqlitePool;

/// Argon2id parameters: 19 MiB memory, 2 iterations, parallelism 1
const ARGON2_M_COST_KIB: u32 = 19_456;
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

const RECOVERY_TOKEN_LEN: usize = 32;
pub const RECOVERY_TOKEN_TTL_SECS: i64 = 3_600;

const MIN_PASSWORD_LEN: usize = 8;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=20;

fn argon2() -> GameResult<Argon2<'static>> {
    let params = Params::new(ARGON2_M_COST_KIB, ARGON2_T_COST, ARGON2_P_COST, None)
        .map_err(|e| GameError::Hashing(format!("invalid Argon2 parameters: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a plaintext password into a PHC-encoded Argon2id string
pub fn hash_password(password: &str) -> GameResult<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| GameError::Hashing(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch; `Err` only if the stored hash is malformed
pub fn verify_password(password: &str, password_hash: &str) -> GameResult<bool> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| GameError::Hashing(e.to_string()))?;
    match argon2()?.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(GameError::Hashing(e.to_string())),
    }
}

// Hashing blocks for tens of milliseconds; run it on the blocking pool.
async fn hash_blocking(password: String) -> GameResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| GameError::Hashing(e.to_string()))?
}

async fn verify_blocking(password: String, password_hash: String) -> GameResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| GameError::Hashing(e.to_string()))?
}

pub fn validate_username(username: &str) -> GameResult<()> {
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(GameError::Validation("username must be 3 to 20 characters".to_string()));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(GameError::Validation(
            "username may only contain letters, digits and underscores".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> GameResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(GameError::Validation("email address is malformed".to_string())),
    }
}

fn validate_password(password: &str) -> GameResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(GameError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn generate_recovery_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RECOVERY_TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub async fn register(pool: &SqlitePool, username: &str, email: &str, password: &str) -> GameResult<User> {
    let username = username.trim();
    let email = email.trim().to_lowercase();
    validate_username(username)?;
    validate_email(&email)?;
    validate_password(password)?;

    let password_hash = hash_blocking(password.to_string()).await?;
    let repo = UserRepository::new(pool.clone());
    match repo.create(&NewUser::new(username.to_string(), email, password_hash)).await {
        Ok(user) => {
            tracing::info!("Registered user {} ({})", user.username, user.id);
            Ok(user)
        }
        Err(DbError::UniqueViolation(msg)) if msg.contains("username") => {
            Err(GameError::Conflict("username already taken".to_string()))
        }
        Err(DbError::UniqueViolation(_)) => Err(GameError::Conflict("email already registered".to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Log in by username or email. Marks the user online and updates the login streak.
pub async fn login(pool: &SqlitePool, identifier: &str, password: &str, now: i64) -> GameResult<User> {
    let repo = UserRepository::new(pool.clone());
    let identifier = identifier.trim();
    let user = if identifier.contains('@') {
        repo.get_by_email(&identifier.to_lowercase()).await?
    } else {
        repo.get_by_username(identifier).await?
    };

    let Some(user) = user else {
        return Err(GameError::InvalidCredentials);
    };
    if !verify_blocking(password.to_string(), user.password_hash.clone()).await? {
        tracing::warn!("Failed login for {}", user.username);
        return Err(GameError::InvalidCredentials);
    }

    repo.set_status(user.id, UserStatus::Online).await?;
    let user = repo.record_login(user.id, now).await?;
    tracing::info!("{} logged in (streak {})", user.username, user.login_streak);
    Ok(user)
}

pub async fn logout(pool: &SqlitePool, user_id: i64) -> GameResult<()> {
    UserRepository::new(pool.clone())
        .set_status(user_id, UserStatus::Offline)
        .await
        .map_err(|e| match e {
            DbError::NotFound => GameError::NotFound("user"),
            other => other.into(),
        })
}

/// Issue a recovery token for the account registered under `email`.
/// Unknown addresses yield `None` so callers can answer identically either way.
pub async fn begin_recovery(pool: &SqlitePool, email: &str, now: i64) -> GameResult<Option<String>> {
    let repo = UserRepository::new(pool.clone());
    let Some(user) = repo.get_by_email(&email.trim().to_lowercase()).await? else {
        tracing::debug!("Recovery requested for unknown email");
        return Ok(None);
    };

    let token = generate_recovery_token();
    repo.set_recovery_token(user.id, &token, now + RECOVERY_TOKEN_TTL_SECS).await?;
    tracing::info!("Issued recovery token for user {}", user.id);
    Ok(Some(token))
}

pub async fn complete_recovery(pool: &SqlitePool, token: &str, new_password: &str, now: i64) -> GameResult<()> {
    validate_password(new_password)?;
    let repo = UserRepository::new(pool.clone());
    let user = repo
        .get_by_recovery_token(token, now)
        .await?
        .ok_or(GameError::NotFound("recovery token"))?;

    let password_hash = hash_blocking(new_password.to_string()).await?;
    repo.set_password_hash(user.id, &password_hash).await?;
    repo.clear_recovery_token(user.id).await?;
    tracing::info!("Password reset for user {}", user.id);
    Ok(())
}
