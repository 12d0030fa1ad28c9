use anyhow::Context;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub struct UploadItem<'a> {
    pub body: Bytes,
    pub content_type: &'a str,
}

/// Stores a profile image for `user_id` and returns its public URL.
///
/// The user's profile reference is left untouched; clients follow up with
/// `update-profile-image`.
pub async fn upload_profile_image(
    st: &AppState,
    user_id: Uuid,
    image: UploadItem<'_>,
) -> Result<String, AppError> {
    if image.body.is_empty() {
        return Err(AppError::InvalidInput("Image is empty".into()));
    }
    let ext = ext_from_mime(image.content_type).ok_or_else(|| {
        AppError::InvalidInput(format!("Unsupported image type {}", image.content_type))
    })?;

    let key = profile_image_key(user_id, Uuid::new_v4(), ext);
    let size = image.body.len();
    st.storage
        .put_object(&key, image.body, image.content_type)
        .await
        .with_context(|| format!("put_object {}", key))
        .map_err(AppError::Internal)?;

    info!(%user_id, %key, size, "profile image uploaded");
    Ok(st.storage.public_url(&key))
}

fn profile_image_prefix(user_id: Uuid) -> String {
    format!("profile-images/{}/", user_id)
}

fn profile_image_key(user_id: Uuid, image_id: Uuid, ext: &str) -> String {
    format!("{}{}.{}", profile_image_prefix(user_id), image_id, ext)
}

/// True when `key` lies in the upload area of `user_id`.
pub fn is_own_image_key(user_id: Uuid, key: &str) -> bool {
    key.strip_prefix(&profile_image_prefix(user_id))
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod image_tests {
    use crate::state::AppState;

    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn own_image_key_is_scoped_to_user() {
        let (ana, bo) = (Uuid::new_v4(), Uuid::new_v4());
        let key = profile_image_key(ana, Uuid::new_v4(), "png");
        assert!(is_own_image_key(ana, &key));
        assert!(!is_own_image_key(bo, &key));
        assert!(!is_own_image_key(ana, &format!("profile-images/{ana}/")));
        assert!(!is_own_image_key(ana, &format!("profile-images/{ana}/x/../y.png")));
        assert!(!is_own_image_key(ana, "other/a.png"));
    }

    #[tokio::test]
    async fn upload_stores_under_user_prefix() {
        let (state, fakes) = AppState::fake();
        let user_id = Uuid::new_v4();
        let url = upload_profile_image(
            &state,
            user_id,
            UploadItem {
                body: Bytes::from_static(b"\x89PNG"),
                content_type: "image/png",
            },
        )
        .await
        .unwrap();

        let prefix = format!("/uploads/profile-images/{}/", user_id);
        assert!(url.starts_with(&prefix));
        assert!(url.ends_with(".png"));
        let key = state.storage.key_from_url(&url).unwrap();
        assert!(fakes.storage.objects.lock().await.contains_key(&key));
    }

    #[tokio::test]
    async fn upload_rejects_non_images() {
        let (state, fakes) = AppState::fake();
        let err = upload_profile_image(
            &state,
            Uuid::new_v4(),
            UploadItem {
                body: Bytes::from_static(b"MZ"),
                content_type: "application/x-msdownload",
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(fakes.storage.objects.lock().await.is_empty());
    }
}
