use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalog_http::error::AppError;

use super::models::{Book, BookInput, Created, NewBook};
use super::store::BookStore;
use crate::utils;

type SharedStore = Arc<dyn BookStore>;

/// HTTP routes for the Books module, relative to the module mount point.
pub fn router(store: SharedStore) -> Router {
    let prefix = utils::log_prefix("books");
    tracing::debug!(target: "catalog.routes", %prefix, "registering books routes");

    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/{id}", get(get_book).put(update_book))
        .with_state(store)
}

async fn list_books(State(store): State<SharedStore>) -> Result<Json<Vec<Book>>, AppError> {
    let books = store.list().await?;
    tracing::debug!(count = books.len(), "listed books");
    Ok(Json(books))
}

async fn get_book(
    State(store): State<SharedStore>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("book {id} does not exist")))
}

async fn create_book(
    State(store): State<SharedStore>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>), AppError> {
    let new_book = validated(payload)?;
    let book = store.insert(new_book).await?;

    tracing::info!(
        prefix = %utils::log_prefix("books"),
        book_id = book.id,
        "book created"
    );

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Book has been created".to_string(),
            book,
        }),
    ))
}

async fn update_book(
    State(store): State<SharedStore>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    let new_book = validated(payload)?;

    let book = store
        .replace(id, new_book)
        .await?
        .ok_or_else(|| AppError::not_found(format!("book {id} does not exist")))?;

    tracing::info!(
        prefix = %utils::log_prefix("books"),
        book_id = book.id,
        "book updated"
    );
    Ok(Json(book))
}

fn validated(payload: Result<Json<BookInput>, JsonRejection>) -> Result<NewBook, AppError> {
    let Json(input) = payload?;
    input.validate().map_err(|errors| {
        let details = errors
            .iter()
            .map(|e| serde_json::json!({ "field": e.field, "error": e.error }))
            .collect();
        AppError::validation(details, "book input is invalid")
    })
}
