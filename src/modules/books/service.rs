use std::sync::Arc;

use bookshelf_http::error::{AppError, FieldErrors};
use bookshelf_kernel::settings::PagerSettings;
use thiserror::Error;

use super::criteria::{book_criteria, scope, ListParams};
use super::models::{Book, BookId, NewBook};
use super::repository::{BookRepository, RepositoryError};
use super::validation::FieldMap;
use crate::utils::{ListResponse, Paginate};

#[derive(Debug, Error)]
pub enum BookError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    NotFound(String),

    /// A write rejected by storage
    #[error("{0}")]
    Persistence(String),

    /// A read that storage could not serve
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl From<BookError> for AppError {
    fn from(error: BookError) -> Self {
        match error {
            BookError::Validation(errors) => AppError::validation(errors, "validation failed"),
            BookError::NotFound(message) => AppError::not_found(message),
            BookError::Persistence(message) => AppError::bad_request(message),
            BookError::Storage(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

fn not_found(id: BookId) -> BookError {
    BookError::NotFound(format!("book with id {id} not found"))
}

fn persistence(error: RepositoryError) -> BookError {
    BookError::Persistence(error.to_string())
}

/// List, show, create, update and delete for the books resource.
pub struct BookService {
    repository: Arc<dyn BookRepository>,
    pager: PagerSettings,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>, pager: PagerSettings) -> Self {
        Self { repository, pager }
    }

    pub fn per_page(&self) -> u32 {
        self.pager.per_page
    }

    pub async fn list(&self, params: &ListParams) -> Result<ListResponse<Book>, BookError> {
        let page = params.page();
        let per_page = self.pager.per_page;
        let criteria = [scope(params), book_criteria()];

        let (data, total) = self.repository.list(&criteria, page, per_page).await?;

        tracing::debug!(page, per_page, total, returned = data.len(), "listed books");
        Ok(ListResponse {
            data,
            paginate: Paginate::new(page, per_page, total),
        })
    }

    pub async fn get(&self, id: BookId) -> Result<Book, BookError> {
        self.repository
            .find(id, &[book_criteria()])
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, fields: FieldMap) -> Result<Book, BookError> {
        let book = NewBook::from_fields(&fields.sanitized()).map_err(BookError::Validation)?;

        let id = self.repository.create(&book).await.map_err(persistence)?;
        tracing::info!(book_id = id, "book created");

        self.repository.find(id, &[]).await?.ok_or_else(|| not_found(id))
    }

    /// Replace every field of a book. Partial bodies fail the required rules.
    ///
    /// Unlike create, the submitted values are stored without entity encoding.
    pub async fn update(&self, id: BookId, fields: FieldMap) -> Result<BookId, BookError> {
        let book = NewBook::from_fields(&fields).map_err(BookError::Validation)?;

        let affected = self
            .repository
            .update(id, &book)
            .await
            .map_err(persistence)?;
        if affected == 0 {
            return Err(not_found(id));
        }

        tracing::info!(book_id = id, "book updated");
        Ok(id)
    }

    pub async fn delete(&self, id: BookId) -> Result<BookId, BookError> {
        let affected = self.repository.delete(id).await.map_err(persistence)?;
        if affected == 0 {
            return Err(BookError::NotFound(format!(
                "book with id {id} not found or already deleted"
            )));
        }

        tracing::info!(book_id = id, "book deleted");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::repository::SqlBookRepository;
    use crate::modules::books::test_support::{memory_pool, valid_fields};
    use chrono::{TimeZone, Utc};
    use sqlx::SqlitePool;

    async fn service(per_page: u32) -> BookService {
        service_with_pool(per_page).await.0
    }

    async fn service_with_pool(per_page: u32) -> (BookService, SqlitePool) {
        let pool = memory_pool().await;
        let repository = Arc::new(SqlBookRepository::new(pool.clone()));
        (BookService::new(repository, PagerSettings { per_page }), pool)
    }

    #[tokio::test]
    async fn create_assigns_id_and_get_returns_fields() {
        let service = service(20).await;
        let created = service
            .create(valid_fields("The Rust Programming Language"))
            .await
            .unwrap();

        let fetched = service.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.title, "The Rust Programming Language");
        assert_eq!(fetched.author, "Steve Klabnik");
        assert_eq!(fetched.status_id, 1);
    }

    #[tokio::test]
    async fn invalid_payload_creates_nothing() {
        let service = service(20).await;
        let err = service.create(valid_fields("Short")).await.unwrap_err();

        match err {
            BookError::Validation(errors) => {
                assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["title"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(service.list(&ListParams::default()).await.unwrap().paginate.total_count, 0);
    }

    #[tokio::test]
    async fn create_sanitizes_before_storing() {
        let service = service(20).await;
        let book = service
            .create(valid_fields("Rust & <Friends>"))
            .await
            .unwrap();
        assert_eq!(book.title, "Rust &#38; &#60;Friends&#62;");
    }

    #[tokio::test]
    async fn padded_short_title_is_rejected() {
        let service = service(20).await;
        let err = service.create(valid_fields("   Rust    ")).await.unwrap_err();

        assert!(matches!(err, BookError::Validation(ref e) if e.contains_key("title")));
        assert_eq!(service.list(&ListParams::default()).await.unwrap().paginate.total_count, 0);
    }

    #[tokio::test]
    async fn update_stores_submitted_text_unencoded() {
        let service = service(20).await;
        let book = service.create(valid_fields("Keep this volume")).await.unwrap();

        service
            .update(book.id, valid_fields("Rust & <Friends> Revised"))
            .await
            .unwrap();
        assert_eq!(service.get(book.id).await.unwrap().title, "Rust & <Friends> Revised");
    }

    #[tokio::test]
    async fn update_refreshes_updated_at() {
        let (service, pool) = service_with_pool(20).await;
        let book = service.create(valid_fields("Keep this volume")).await.unwrap();

        let past = Utc.with_ymd_and_hms(2001, 2, 3, 4, 5, 6).unwrap();
        sqlx::query("UPDATE books SET created_at = ?, updated_at = ? WHERE id = ?")
            .bind(past)
            .bind(past)
            .bind(book.id)
            .execute(&pool)
            .await
            .unwrap();

        service
            .update(book.id, valid_fields("Programming Rust Revised"))
            .await
            .unwrap();

        let updated = service.get(book.id).await.unwrap();
        assert_eq!(updated.created_at, past);
        assert!(updated.updated_at > past);
    }

    #[tokio::test]
    async fn unknown_status_is_a_persistence_error() {
        let service = service(20).await;
        let mut fields = valid_fields("The Rust Programming Language");
        fields.insert("status_id", "42");

        let err = service.create(fields).await.unwrap_err();
        assert!(matches!(err, BookError::Persistence(ref m) if m.contains("FOREIGN KEY")));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let service = service(20).await;
        let err = service.get(7).await.unwrap_err();
        assert_eq!(err.to_string(), "book with id 7 not found");
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let service = service(20).await;
        let err = service.delete(7).await.unwrap_err();
        assert_eq!(err.to_string(), "book with id 7 not found or already deleted");
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_row() {
        let service = service(20).await;
        let keep = service.create(valid_fields("Keep this volume")).await.unwrap();
        let drop = service.create(valid_fields("Drop this volume")).await.unwrap();

        assert_eq!(service.delete(drop.id).await.unwrap(), drop.id);

        let listed = service.list(&ListParams::default()).await.unwrap();
        assert_eq!(listed.paginate.total_count, 1);
        assert_eq!(listed.data[0].id, keep.id);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let service = service(20).await;
        let err = service
            .update(3, valid_fields("The Rust Programming Language"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "book with id 3 not found");
    }

    #[tokio::test]
    async fn partial_update_fails_required_rules() {
        let service = service(20).await;
        let book = service.create(valid_fields("Keep this volume")).await.unwrap();

        let partial = FieldMap::from_iter([("title", "Only the title changes")]);
        let err = service.update(book.id, partial).await.unwrap_err();
        match err {
            BookError::Validation(errors) => {
                assert!(errors.contains_key("author"));
                assert!(!errors.contains_key("title"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_pages_follow_configured_size() {
        let service = service(3).await;
        for n in 0..7 {
            service
                .create(valid_fields(&format!("Collected volume {n}")))
                .await
                .unwrap();
        }

        let first = service.list(&ListParams::default()).await.unwrap();
        assert_eq!(first.data.len(), 3);
        assert_eq!(first.paginate.total_pages, 3);
        assert_eq!(first.paginate.per_page, 3);

        let beyond = service
            .list(&ListParams {
                page: Some(4),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.paginate.total_count, 7);
    }

    #[tokio::test]
    async fn list_of_empty_table_is_empty() {
        let listed = service(20).await.list(&ListParams::default()).await.unwrap();
        assert!(listed.data.is_empty());
        assert_eq!(listed.paginate.total_count, 0);
        assert_eq!(listed.paginate.total_pages, 0);
    }

    #[tokio::test]
    async fn full_lifecycle_leaves_nothing_behind() {
        let service = service(20).await;
        let created = service
            .create(valid_fields("The Rust Programming Language"))
            .await
            .unwrap();
        assert_eq!(service.get(created.id).await.unwrap().title, created.title);

        let mut fields = valid_fields("Programming Rust, Second Edition");
        fields.insert("status_id", "2");
        fields.insert("author", "Jim Blandy and Jason Orendorff");
        fields.insert("description", "Fast, safe systems development");
        assert_eq!(service.update(created.id, fields).await.unwrap(), created.id);

        let updated = service.get(created.id).await.unwrap();
        assert_eq!(updated.title, "Programming Rust, Second Edition");
        assert_eq!(updated.author, "Jim Blandy and Jason Orendorff");
        assert_eq!(updated.description, "Fast, safe systems development");
        assert_eq!(updated.status_id, 2);
        assert_eq!(updated.status.as_deref(), Some("draft"));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        service.delete(created.id).await.unwrap();
        assert!(matches!(
            service.get(created.id).await,
            Err(BookError::NotFound(_))
        ));
        assert_eq!(service.list(&ListParams::default()).await.unwrap().paginate.total_count, 0);
    }
}
