use crate::auth::Operation;
use crate::http::handler::{ApiError, ApiSuccess, parse_id};
use crate::http::serializer::{self, AuthorHttpResponse, Mode};
use crate::http::{AppState, RequestContext, payload};
use crate::models::{DeleteAuthorRequest, FindAuthorRequest};
use crate::repositories::Store;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;

pub async fn list_authors<S: Store>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
) -> Result<ApiSuccess<Vec<AuthorHttpResponse>>, ApiError> {
    ctx.authorize(Operation::List)?;
    let authors = state.store().find_all_authors().await?;
    let authors = authors.into_iter().map(AuthorHttpResponse::from).collect();
    Ok(ApiSuccess::new(StatusCode::OK, authors))
}

pub async fn create_author<S: Store>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    request: Request,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    ctx.authorize(Operation::Create)?;
    let fields = payload::decode(request).await?;
    let req = serializer::decode_new_author(&fields)?;
    let author = state.store().create_author(&req).await?;
    tracing::info!(id = author.id(), "created author");
    Ok(ApiSuccess::new(StatusCode::CREATED, author.into()))
}

pub async fn get_author<S: Store>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    ctx.authorize(Operation::Retrieve)?;
    let id = parse_id(&id)?;
    let author = state
        .store()
        .find_author(&FindAuthorRequest::new(id))
        .await?;
    Ok(ApiSuccess::new(StatusCode::OK, author.into()))
}

pub async fn replace_author<S: Store>(
    state: State<AppState<S>>,
    ctx: RequestContext,
    id: Path<String>,
    request: Request,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    update_author(state, ctx, id, request, Mode::Full).await
}

pub async fn patch_author<S: Store>(
    state: State<AppState<S>>,
    ctx: RequestContext,
    id: Path<String>,
    request: Request,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    update_author(state, ctx, id, request, Mode::Partial).await
}

async fn update_author<S: Store>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    Path(id): Path<String>,
    request: Request,
    mode: Mode,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    ctx.authorize(Operation::Update)?;
    let id = parse_id(&id)?;
    state
        .store()
        .find_author(&FindAuthorRequest::new(id))
        .await?;

    let fields = payload::decode(request).await?;
    let req = serializer::decode_author_changes(id, &fields, mode)?;
    let author = state.store().update_author(&req).await?;
    tracing::info!(id, "updated author");
    Ok(ApiSuccess::new(StatusCode::OK, author.into()))
}

/// Removes the author together with every book referencing it.
pub async fn delete_author<S: Store>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.authorize(Operation::Delete)?;
    let id = parse_id(&id)?;
    state
        .store()
        .delete_author(&DeleteAuthorRequest::new(id))
        .await?;
    tracing::info!(id, "deleted author");
    Ok(StatusCode::NO_CONTENT)
}
