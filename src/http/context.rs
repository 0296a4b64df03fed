use crate::auth::{self, Operation, Principal};
use crate::http::AppState;
use crate::http::handler::ApiError;
use crate::repositories::Store;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Per-request state resolved before a handler runs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    principal: Principal,
}

impl RequestContext {
    pub const fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn authorize(&self, operation: Operation) -> Result<(), ApiError> {
        auth::authorize(&self.principal, operation).map_err(|denied| {
            tracing::info!(principal = ?self.principal, ?operation, "{denied}");
            ApiError::from(denied)
        })
    }
}

impl<S: Store> FromRequestParts<AppState<S>> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let principal = auth::authenticate(&parts.headers, state.store()).await?;
        Ok(Self::new(principal))
    }
}
