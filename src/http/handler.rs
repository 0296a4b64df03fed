pub mod authors;
pub mod books;

use crate::auth::AccessDenied;
use crate::http::payload::PayloadError;
use crate::http::serializer::{DecodeError, FieldErrors, unknown_author_message};
use crate::models::{
    CreateAuthorError, CreateBookError, CredentialStoreError, DeleteAuthorError, DeleteBookError,
    FindAllAuthorsError, FindAuthorError, FindBookError, FindBooksError, UpdateAuthorError,
    UpdateBookError,
};
use axum::extract::Json;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub const fn new(status: StatusCode, data: T) -> Self {
        Self(status, Json(data))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Serialize)]
struct Detail {
    detail: String,
}

impl Detail {
    fn response(status: StatusCode, detail: String) -> Response {
        (status, Json(Self { detail })).into_response()
    }
}

#[derive(Debug)]
pub enum ApiError {
    InternalServerError,
    NotFound,
    BadRequest(FieldErrors),
    Unauthorized(String),
    Forbidden(String),
    UnsupportedMediaType(String),
}

impl ApiError {
    fn internal(cause: &anyhow::Error) -> Self {
        tracing::error!("{cause:?}");
        Self::InternalServerError
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InternalServerError => Detail::response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::BadRequest(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Self::Unauthorized(msg) => {
                let mut response = Detail::response(StatusCode::UNAUTHORIZED, msg);
                response.headers_mut().insert(
                    WWW_AUTHENTICATE,
                    HeaderValue::from_static(r#"Basic realm="api""#),
                );
                response
            }
            Self::Forbidden(msg) => Detail::response(StatusCode::FORBIDDEN, msg),
            Self::UnsupportedMediaType(msg) => {
                Detail::response(StatusCode::UNSUPPORTED_MEDIA_TYPE, msg)
            }
        }
    }
}

impl From<AccessDenied> for ApiError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Unauthenticated => Self::Unauthorized(denied.to_string()),
            AccessDenied::Forbidden => Self::Forbidden(denied.to_string()),
        }
    }
}

impl From<CredentialStoreError> for ApiError {
    fn from(err: CredentialStoreError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::UnsupportedMediaType(_) => Self::UnsupportedMediaType(err.to_string()),
            PayloadError::Malformed(msg) => {
                Self::BadRequest(FieldErrors::single("non_field_errors", msg))
            }
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::BadRequest(errors)
    }
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Invalid(errors) => Self::BadRequest(errors),
            DecodeError::Store(cause) => Self::internal(&cause),
        }
    }
}

impl From<CreateAuthorError> for ApiError {
    fn from(err: CreateAuthorError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<FindAuthorError> for ApiError {
    fn from(err: FindAuthorError) -> Self {
        match err {
            FindAuthorError::NotFound { .. } => Self::NotFound,
            FindAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<FindAllAuthorsError> for ApiError {
    fn from(err: FindAllAuthorsError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<UpdateAuthorError> for ApiError {
    fn from(err: UpdateAuthorError) -> Self {
        match err {
            UpdateAuthorError::NotFound { .. } => Self::NotFound,
            UpdateAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<DeleteAuthorError> for ApiError {
    fn from(err: DeleteAuthorError) -> Self {
        match err {
            DeleteAuthorError::NotFound { .. } => Self::NotFound,
            DeleteAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<CreateBookError> for ApiError {
    fn from(err: CreateBookError) -> Self {
        match err {
            CreateBookError::UnknownAuthor { author_id } => Self::BadRequest(FieldErrors::single(
                "author",
                unknown_author_message(author_id),
            )),
            CreateBookError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<FindBookError> for ApiError {
    fn from(err: FindBookError) -> Self {
        match err {
            FindBookError::NotFound { .. } => Self::NotFound,
            FindBookError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<FindBooksError> for ApiError {
    fn from(err: FindBooksError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<UpdateBookError> for ApiError {
    fn from(err: UpdateBookError) -> Self {
        match err {
            UpdateBookError::NotFound { .. } => Self::NotFound,
            UpdateBookError::UnknownAuthor { author_id } => Self::BadRequest(FieldErrors::single(
                "author",
                unknown_author_message(author_id),
            )),
            UpdateBookError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<DeleteBookError> for ApiError {
    fn from(err: DeleteBookError) -> Self {
        match err {
            DeleteBookError::NotFound { .. } => Self::NotFound,
            DeleteBookError::Other(cause) => Self::internal(&cause),
        }
    }
}

/// Item ids that are not integers name no record at all.
pub(crate) fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}
