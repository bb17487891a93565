//! Request extractors shared by the route handlers.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Path parameter holding a record id.
///
/// An id that does not parse (non-numeric, or outside the `i32` range) can
/// never match a row, so it is answered with 404 like any other unknown id.
#[derive(Debug)]
pub struct IdPath<T>(pub T);

impl<S, T> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => {
                tracing::debug!(path = %parts.uri.path(), "Unparseable id: {rejection}");
                Err(AppError::NotFound(format!("no record at {}", parts.uri.path())))
            }
        }
    }
}
