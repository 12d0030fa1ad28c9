use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
};

use crate::error::AppError;

/// `Json` whose rejections render as `AppError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Multipart` whose rejections render as `AppError`.
pub struct AppMultipart(pub Multipart);

#[async_trait]
impl<S> FromRequest<S> for AppMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mp = Multipart::from_request(req, state).await?;
        Ok(Self(mp))
    }
}
