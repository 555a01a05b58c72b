use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::RegisterRequest,
        jwt::{JwtKeys, TokenError},
        password::Hasher,
        repo::UserStore,
        repo_types::{NewUser, StoreError, User},
    },
    error::{AppError, AppResult},
};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validate_registration(req: &RegisterRequest) -> AppResult<()> {
    if !is_valid_email(&req.email) {
        return Err(AppError::Validation("email: value is not a valid email address".into()));
    }
    let name_len = req.username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&name_len) {
        return Err(AppError::Validation(format!(
            "username: length must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }
    if req.password.chars().count() < PASSWORD_MIN {
        return Err(AppError::Validation(format!(
            "password: must be at least {PASSWORD_MIN} characters"
        )));
    }
    Ok(())
}

fn store_failure(e: StoreError) -> AppError {
    error!(error = %e, "user store failed");
    AppError::Internal(e.into())
}

/// Validates, rejects a taken email, hashes and persists.
pub async fn register(
    users: &dyn UserStore,
    hasher: &Hasher,
    mut req: RegisterRequest,
) -> AppResult<User> {
    req.email = normalize_email(&req.email);
    validate_registration(&req)?;

    if users.find_by_email(&req.email).await.map_err(store_failure)?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let hashed_password = hasher.hash_async(&req.password).await?;
    let new_user = NewUser {
        email: req.email,
        username: req.username,
        hashed_password,
        created_at: OffsetDateTime::now_utc(),
        is_active: true,
    };

    // The unique index catches registrations racing past the lookup above.
    let user = match users.insert(new_user).await {
        Ok(u) => u,
        Err(StoreError::Duplicate) => {
            warn!("email registered concurrently");
            return Err(AppError::DuplicateEmail);
        }
        Err(e) => return Err(store_failure(e)),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Checks credentials and issues an access token bound to the email.
pub async fn login(
    users: &dyn UserStore,
    hasher: &Hasher,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> AppResult<String> {
    let email = normalize_email(email);

    let user = match users.find_by_email(&email).await.map_err(store_failure)? {
        Some(u) => u,
        None => {
            hasher.verify_decoy_async(password).await;
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !hasher.verify_async(password, &user.hashed_password).await {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.issue(&user.email)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

/// Maps a bearer token to a stored user.
pub async fn resolve_current_user(
    users: &dyn UserStore,
    keys: &JwtKeys,
    token: &str,
) -> AppResult<User> {
    let subject = keys.validate(token).map_err(|e| {
        match e {
            TokenError::InvalidToken => warn!("invalid or expired token"),
            TokenError::MissingSubject => warn!("token without subject"),
        }
        AppError::Unauthorized
    })?;

    match users.find_by_email(&subject).await.map_err(store_failure)? {
        Some(user) => Ok(user),
        None => {
            warn!(subject = %subject, "token subject has no user");
            Err(AppError::Unauthorized)
        }
    }
}
