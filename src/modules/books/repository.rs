use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

use super::criteria::{self, BookQuery, Condition, Criterion};
use super::models::{Book, BookId, NewBook};

const SELECT_BOOKS: &str = "SELECT books.id, books.status_id, status.status AS status, \
     books.title, books.author, books.description, books.created_at, books.updated_at \
     FROM books LEFT JOIN status ON status.id = books.status_id";

const COUNT_BOOKS: &str =
    "SELECT COUNT(*) FROM books LEFT JOIN status ON status.id = books.status_id";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Persistence seam for the books resource.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Fetch one book matching the id and every criterion.
    async fn find(&self, id: BookId, criteria: &[Criterion]) -> RepositoryResult<Option<Book>>;

    /// Fetch one page of books plus the total number of matching rows.
    async fn list(
        &self,
        criteria: &[Criterion],
        page: u32,
        per_page: u32,
    ) -> RepositoryResult<(Vec<Book>, u64)>;

    /// Insert a book and return its assigned id.
    async fn create(&self, book: &NewBook) -> RepositoryResult<BookId>;

    /// Replace a book's fields, returning the number of rows affected.
    async fn update(&self, id: BookId, book: &NewBook) -> RepositoryResult<u64>;

    /// Hard delete, returning the number of rows affected.
    async fn delete(&self, id: BookId) -> RepositoryResult<u64>;
}

pub struct SqlBookRepository {
    pool: SqlitePool,
}

impl SqlBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so user input only ever matches literally.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, query: &BookQuery) {
    for (index, condition) in query.conditions.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });

        match condition {
            Condition::EqInt(column, value) => {
                builder.push(column.as_sql()).push(" = ").push_bind(*value);
            }
            Condition::Contains(column, needle) => {
                builder
                    .push(column.as_sql())
                    .push(" LIKE ")
                    .push_bind(like_pattern(needle))
                    .push(" ESCAPE '\\'");
            }
            Condition::ContainsAny(columns, needle) => {
                builder.push("(");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        builder.push(" OR ");
                    }
                    builder
                        .push(column.as_sql())
                        .push(" LIKE ")
                        .push_bind(like_pattern(needle))
                        .push(" ESCAPE '\\'");
                }
                builder.push(")");
            }
            Condition::NotNull(column) => {
                builder.push(column.as_sql()).push(" IS NOT NULL");
            }
        }
    }
}

fn push_order(builder: &mut QueryBuilder<'_, Sqlite>, query: &BookQuery) {
    if let Some((column, order)) = query.order_by {
        builder
            .push(" ORDER BY ")
            .push(column.as_sql())
            .push(" ")
            .push(order.as_sql());
        // Stable paging when the sort column has duplicates
        if column != criteria::Column::Id {
            builder.push(", books.id ASC");
        }
    }
}

#[async_trait]
impl BookRepository for SqlBookRepository {
    async fn find(&self, id: BookId, criteria: &[Criterion]) -> RepositoryResult<Option<Book>> {
        let mut query = criteria::apply(criteria);
        query.filter(Condition::EqInt(criteria::Column::Id, id));

        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_BOOKS);
        push_where(&mut builder, &query);

        let book = builder
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn list(
        &self,
        criteria: &[Criterion],
        page: u32,
        per_page: u32,
    ) -> RepositoryResult<(Vec<Book>, u64)> {
        let query = criteria::apply(criteria);

        let mut count = QueryBuilder::<Sqlite>::new(COUNT_BOOKS);
        push_where(&mut count, &query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let per_page = i64::from(per_page.max(1));
        let offset = i64::from(page.max(1) - 1) * per_page;

        let mut select = QueryBuilder::<Sqlite>::new(SELECT_BOOKS);
        push_where(&mut select, &query);
        push_order(&mut select, &query);
        select
            .push(" LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind(offset);

        let books = select
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok((books, u64::try_from(total).unwrap_or_default()))
    }

    async fn create(&self, book: &NewBook) -> RepositoryResult<BookId> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO books (status_id, title, author, description, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(book.status_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, id: BookId, book: &NewBook) -> RepositoryResult<u64> {
        let result = sqlx::query(
            "UPDATE books SET status_id = ?, title = ?, author = ?, description = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(book.status_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: BookId) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
