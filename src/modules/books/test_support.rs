use bookshelf_kernel::settings::DatabaseSettings;
use sqlx::SqlitePool;

use super::models::NewBook;
use super::validation::FieldMap;
use super::BooksModule;

/// Fresh in-memory database with the books schema applied.
pub async fn memory_pool() -> SqlitePool {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    let pool = bookshelf_db::connect(&settings).await.unwrap();

    let migrations: Vec<(String, _)> = BooksModule::schema()
        .into_iter()
        .map(|m| ("books".to_string(), m))
        .collect();
    bookshelf_db::migrate(&pool, &migrations).await.unwrap();
    pool
}

pub fn sample_book(title: &str) -> NewBook {
    NewBook {
        status_id: 1,
        title: title.to_string(),
        author: "Tim McNamara".to_string(),
        description: "Systems programming explained".to_string(),
    }
}

pub fn valid_fields(title: &str) -> FieldMap {
    FieldMap::from_iter([
        ("status_id", "1"),
        ("title", title),
        ("author", "Steve Klabnik"),
        ("description", "An introduction to Rust"),
    ])
}

