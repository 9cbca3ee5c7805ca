use anyhow::Context;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use bookshelf_http::{AppError, JsonBody};

use super::models::{Book, BookPayload, Created, Message};
use super::repository::BookRepository;

const NOT_FOUND: &str = "Book not found";

/// Routes for the books module, bound to `repo`.
pub fn router(repo: BookRepository) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/books", get(list_books).post(create_book))
        .route("/healthz/books", get(health_check))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(repo)
}

async fn welcome() -> &'static str {
    "Welcome to the Book API!"
}

async fn health_check(State(repo): State<BookRepository>) -> Result<&'static str, AppError> {
    repo.ping().await.context("books storage is unreachable")?;
    Ok("books module is healthy")
}

async fn list_books(State(repo): State<BookRepository>) -> Result<Json<Vec<Book>>, AppError> {
    let books = repo.list().await.context("failed to list books")?;
    Ok(Json(books))
}

async fn get_book(
    State(repo): State<BookRepository>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    repo.get(&id)
        .await
        .with_context(|| format!("failed to get book '{}'", id))?
        .map(Json)
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

async fn create_book(
    State(repo): State<BookRepository>,
    JsonBody(payload): JsonBody<BookPayload>,
) -> Result<Json<Created>, AppError> {
    let id = repo
        .create(payload)
        .await
        .context("failed to insert book")?;
    tracing::debug!(book_id = id, "book created");
    Ok(Json(Created { id }))
}

async fn update_book(
    State(repo): State<BookRepository>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<BookPayload>,
) -> Result<Json<Message>, AppError> {
    let updated = repo
        .update(&id, payload)
        .await
        .with_context(|| format!("failed to update book '{}'", id))?;
    if !updated {
        return Err(AppError::not_found(NOT_FOUND));
    }
    Ok(Json(Message::new("Book updated")))
}

async fn delete_book(
    State(repo): State<BookRepository>,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    let deleted = repo
        .delete(&id)
        .await
        .with_context(|| format!("failed to delete book '{}'", id))?;
    if !deleted {
        return Err(AppError::not_found(NOT_FOUND));
    }
    Ok(Json(Message::new("Book deleted")))
}
