//! HTTP handlers for the books resource.

mod extract;

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::error::AppError;
use serde::Serialize;

use super::criteria::ListParams;
use super::models::{Book, BookId, BookRef};
use super::service::BookService;
use super::validation::FieldMap;
use crate::utils::ListResponse;

type BookState = State<Arc<BookService>>;

/// `{data, message}` envelope for single-resource responses.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    fn data(data: T) -> Json<Self> {
        Json(Self {
            data,
            message: None,
        })
    }

    fn with_message(data: T, message: String) -> Json<Self> {
        Json(Self {
            data,
            message: Some(message),
        })
    }
}

pub fn router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(show_book)
                .put(update_book)
                .patch(update_book)
                .delete(delete_book),
        )
        .route("/{id}/edit", get(show_book))
        .with_state(service)
}

fn book_id(path: Result<Path<BookId>, PathRejection>) -> Result<BookId, AppError> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::bad_request(e.body_text()))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(
    State(service): BookState,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse<Book>>, AppError> {
    let Query(params) = params.map_err(|e| AppError::bad_request(e.body_text()))?;
    Ok(Json(service.list(&params).await?))
}

async fn show_book(
    State(service): BookState,
    path: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Envelope<Book>>, AppError> {
    let id = book_id(path)?;
    Ok(Envelope::data(service.get(id).await?))
}

async fn create_book(
    State(service): BookState,
    fields: FieldMap,
) -> Result<(StatusCode, Json<Envelope<Book>>), AppError> {
    let book = service.create(fields).await?;
    let message = format!("book id {} created", book.id);
    Ok((StatusCode::CREATED, Envelope::with_message(book, message)))
}

async fn update_book(
    State(service): BookState,
    path: Result<Path<BookId>, PathRejection>,
    fields: FieldMap,
) -> Result<Json<Envelope<BookRef>>, AppError> {
    let id = service.update(book_id(path)?, fields).await?;
    Ok(Envelope::with_message(
        BookRef { id },
        format!("book id {id} updated"),
    ))
}

async fn delete_book(
    State(service): BookState,
    path: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Envelope<BookRef>>, AppError> {
    let id = service.delete(book_id(path)?).await?;
    Ok(Envelope::with_message(
        BookRef { id },
        format!("book id {id} deleted"),
    ))
}
