use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{ChangePasswordRequest, LoginRequest, SignUpRequest, UpdateProfileRequest};
use super::extractors::resolve_session;
use super::password::{hash_password_blocking, verify_password_blocking};
use super::repo_types::{NewUser, User};
use crate::{error::AppError, images::services::is_own_image_key, state::AppState};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn checked_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim();
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::InvalidInput("Invalid email".into()));
    }
    Ok(email.to_string())
}

fn checked_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Name must not be empty".into()));
    }
    Ok(name.to_string())
}

fn missing_user(user_id: Uuid) -> AppError {
    warn!(%user_id, "authenticated user vanished");
    AppError::NotFound("user")
}

pub async fn sign_up(st: &AppState, req: SignUpRequest) -> Result<User, AppError> {
    let name = checked_name(&req.name)?;
    let email = checked_email(&req.email)?;
    if req.password.is_empty() {
        return Err(AppError::InvalidInput("Password must not be empty".into()));
    }

    // Fast path only; the UNIQUE constraint is what actually decides.
    if st.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = hash_password_blocking(req.password).await.map_err(|e| {
        error!(error = %e, "hash_password failed");
        AppError::Internal(e)
    })?;

    let user = st
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Returns the session token and the user it is bound to.
pub async fn login(st: &AppState, req: LoginRequest) -> Result<(String, User), AppError> {
    let email = req.email.trim();

    let Some(user) = st.users.find_by_email(email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::UnknownAccount);
    };

    let ok = verify_password_blocking(req.password, user.password_hash.clone())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "verify_password failed");
            AppError::Internal(e)
        })?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::WrongPassword);
    }

    let token = st.keys.issue(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Internal(e)
    })?;

    info!(user_id = %user.id, "user logged in");
    Ok((token, user))
}

/// Never fails: any rejection or internal error reads as `false`.
pub async fn token_is_valid(st: &AppState, token: Option<&str>) -> bool {
    let Some(token) = token else {
        return false;
    };
    match resolve_session(st, token).await {
        Ok(user) => user.is_some(),
        Err(e) => {
            error!(error = %e, "token validity probe failed");
            false
        }
    }
}

pub async fn current_user(st: &AppState, user_id: Uuid) -> Result<User, AppError> {
    st.users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| missing_user(user_id))
}

pub async fn change_password(
    st: &AppState,
    user_id: Uuid,
    req: ChangePasswordRequest,
) -> Result<User, AppError> {
    if req.new_password.is_empty() {
        return Err(AppError::InvalidInput("Password must not be empty".into()));
    }
    let user = current_user(st, user_id).await?;

    let ok = verify_password_blocking(req.current_password, user.password_hash)
        .await
        .map_err(AppError::Internal)?;
    if !ok {
        warn!(%user_id, "change password with wrong current password");
        return Err(AppError::WrongPassword);
    }

    let hash = hash_password_blocking(req.new_password)
        .await
        .map_err(AppError::Internal)?;
    let updated = st
        .users
        .update_password(user_id, &hash)
        .await?
        .ok_or_else(|| missing_user(user_id))?;

    info!(%user_id, "password changed");
    Ok(updated)
}

pub async fn update_profile(
    st: &AppState,
    user_id: Uuid,
    req: UpdateProfileRequest,
) -> Result<User, AppError> {
    let name = checked_name(&req.name)?;
    let email = checked_email(&req.email)?;
    let updated = st
        .users
        .update_profile(user_id, &name, &email)
        .await?
        .ok_or_else(|| missing_user(user_id))?;
    info!(%user_id, "profile updated");
    Ok(updated)
}

/// Sets the profile image reference. Local references must point into the
/// caller's own upload area; external URLs are stored as given.
pub async fn update_profile_image(
    st: &AppState,
    user_id: Uuid,
    image: &str,
) -> Result<User, AppError> {
    let image = image.trim();
    if let Some(key) = st.storage.key_from_url(image) {
        if !is_own_image_key(user_id, &key) {
            warn!(%user_id, %key, "profile image points outside caller's uploads");
            return Err(AppError::InvalidInput(
                "Profile image must be one of your own uploads".into(),
            ));
        }
    }
    let updated = st
        .users
        .set_profile_image(user_id, image)
        .await?
        .ok_or_else(|| missing_user(user_id))?;
    info!(%user_id, "profile image set");
    Ok(updated)
}

/// Deletes the stored file (if it is the caller's upload) and clears the reference.
pub async fn remove_profile_image(st: &AppState, user_id: Uuid) -> Result<User, AppError> {
    let user = current_user(st, user_id).await?;

    let own_key = st
        .storage
        .key_from_url(&user.profile_image)
        .filter(|key| is_own_image_key(user_id, key));
    if let Some(key) = own_key {
        if let Err(e) = st.storage.delete_object(&key).await {
            warn!(error = %e, %user_id, %key, "could not delete profile image file");
        }
    }

    let updated = st
        .users
        .set_profile_image(user_id, "")
        .await?
        .ok_or_else(|| missing_user(user_id))?;
    info!(%user_id, "profile image removed");
    Ok(updated)
}
