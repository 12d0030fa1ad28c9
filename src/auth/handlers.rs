use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, ImageUploadResponse, LoginRequest, PublicUser,
            SessionResponse, SignUpRequest, UpdateProfileImageRequest, UpdateProfileRequest,
        },
        extractors::{token_from_headers, AuthUser},
        services,
    },
    error::AppError,
    extract::{AppJson, AppMultipart},
    images::services::{upload_profile_image, UploadItem},
    state::AppState,
};

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/login", post(login))
        .route("/auth/tokenIsValid", post(token_is_valid))
        .route("/auth", get(get_me))
        .route("/auth/", get(get_me))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/change-password", post(change_password))
        .route("/auth/update-profile", put(update_profile))
        .route("/auth/update-profile-image", put(update_profile_image))
        .route("/auth/remove-profile-image", put(remove_profile_image))
        .route(
            "/auth/upload-profile-image",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignUpRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = services::sign_up(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let (token, user) = services::login(&state, payload).await?;
    Ok(Json(SessionResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip_all)]
pub async fn token_is_valid(State(state): State<AppState>, headers: HeaderMap) -> Json<bool> {
    Json(services::token_is_valid(&state, token_from_headers(&headers)).await)
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let user = services::current_user(&state, auth.user_id).await?;
    Ok(Json(SessionResponse {
        token: auth.token,
        user: user.into(),
    }))
}

#[instrument(skip(state, auth, payload), fields(user_id = %auth.user_id))]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::change_password(&state, auth.user_id, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, auth, payload), fields(user_id = %auth.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::update_profile(&state, auth.user_id, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, auth, payload), fields(user_id = %auth.user_id))]
pub async fn update_profile_image(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<UpdateProfileImageRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::update_profile_image(&state, auth.user_id, &payload.profile_image).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn remove_profile_image(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::remove_profile_image(&state, auth.user_id).await?;
    Ok(Json(user.into()))
}

/// POST /auth/upload-profile-image (multipart, field `image` or `file`)
#[instrument(skip(state, auth, mp), fields(user_id = %auth.user_id))]
pub async fn upload_image(
    State(state): State<AppState>,
    auth: AuthUser,
    AppMultipart(mut mp): AppMultipart,
) -> Result<Json<ImageUploadResponse>, AppError> {
    while let Some(field) = mp.next_field().await? {
        if !matches!(field.name(), Some("image") | Some("file")) {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = field.bytes().await?;
        let image_url = upload_profile_image(
            &state,
            auth.user_id,
            UploadItem {
                body,
                content_type: &content_type,
            },
        )
        .await?;
        return Ok(Json(ImageUploadResponse { image_url }));
    }
    Err(AppError::InvalidInput("image field is required".into()))
}
