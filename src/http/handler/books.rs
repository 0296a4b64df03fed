use crate::auth::Operation;
use crate::http::handler::{ApiError, ApiSuccess, parse_id};
use crate::http::serializer::{self, BookFilterQuery, BookHttpResponse, Mode};
use crate::http::{AppState, RequestContext, payload};
use crate::models::{DeleteBookRequest, FindBookRequest};
use crate::repositories::Store;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;

pub async fn list_books<S: Store>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ApiSuccess<Vec<BookHttpResponse>>, ApiError> {
    ctx.authorize(Operation::List)?;
    let query: BookFilterQuery = params.into_iter().collect();
    let books = state.store().find_books(&query.into()).await?;
    let books = books.into_iter().map(BookHttpResponse::from).collect();
    Ok(ApiSuccess::new(StatusCode::OK, books))
}

pub async fn create_book<S: Store>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    request: Request,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    ctx.authorize(Operation::Create)?;
    let fields = payload::decode(request).await?;
    let req = serializer::decode_new_book(&fields, state.store()).await?;
    let book = state.store().create_book(&req).await?;
    tracing::info!(id = book.id(), "created book");
    Ok(ApiSuccess::new(StatusCode::CREATED, book.into()))
}

pub async fn get_book<S: Store>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    ctx.authorize(Operation::Retrieve)?;
    let id = parse_id(&id)?;
    let book = state.store().find_book(&FindBookRequest::new(id)).await?;
    Ok(ApiSuccess::new(StatusCode::OK, book.into()))
}

pub async fn replace_book<S: Store>(
    state: State<AppState<S>>,
    ctx: RequestContext,
    id: Path<String>,
    request: Request,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    update_book(state, ctx, id, request, Mode::Full).await
}

pub async fn patch_book<S: Store>(
    state: State<AppState<S>>,
    ctx: RequestContext,
    id: Path<String>,
    request: Request,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    update_book(state, ctx, id, request, Mode::Partial).await
}

async fn update_book<S: Store>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    Path(id): Path<String>,
    request: Request,
    mode: Mode,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    ctx.authorize(Operation::Update)?;
    let id = parse_id(&id)?;
    state.store().find_book(&FindBookRequest::new(id)).await?;

    let fields = payload::decode(request).await?;
    let req = serializer::decode_book_changes(id, &fields, mode, state.store()).await?;
    let book = state.store().update_book(&req).await?;
    tracing::info!(id, "updated book");
    Ok(ApiSuccess::new(StatusCode::OK, book.into()))
}

pub async fn delete_book<S: Store>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.authorize(Operation::Delete)?;
    let id = parse_id(&id)?;
    state.store().delete_book(&DeleteBookRequest::new(id)).await?;
    tracing::info!(id, "deleted book");
    Ok(StatusCode::NO_CONTENT)
}
