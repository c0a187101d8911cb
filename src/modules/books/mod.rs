pub mod criteria;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{settings::PagerSettings, InitCtx, Migration, Module};
use serde_json::json;
use sqlx::SqlitePool;

use repository::SqlBookRepository;
use service::BookService;

/// Books resource module: schema, routes and OpenAPI fragment.
pub struct BooksModule {
    service: Arc<BookService>,
}

impl BooksModule {
    pub fn new(service: Arc<BookService>) -> Self {
        Self { service }
    }

    /// Status lookup table and the books table.
    pub fn schema() -> Vec<Migration> {
        vec![
            Migration {
                id: "001_create_status",
                up: r#"
                    CREATE TABLE status (
                        id     INTEGER PRIMARY KEY,
                        status TEXT NOT NULL UNIQUE
                    );
                    INSERT INTO status (id, status) VALUES
                        (1, 'published'),
                        (2, 'draft'),
                        (3, 'archived');
                "#,
            },
            Migration {
                id: "002_create_books",
                up: r#"
                    CREATE TABLE books (
                        id          INTEGER PRIMARY KEY AUTOINCREMENT,
                        status_id   INTEGER NOT NULL REFERENCES status (id),
                        title       TEXT NOT NULL,
                        author      TEXT NOT NULL,
                        description TEXT NOT NULL,
                        created_at  TEXT NOT NULL,
                        updated_at  TEXT NOT NULL
                    );
                    CREATE INDEX books_status_id_idx ON books (status_id);
                "#,
            },
        ]
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let statuses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM status")
            .fetch_one(ctx.db)
            .await
            .context("books schema is missing; run migrations first")?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            per_page = self.service.per_page(),
            statuses,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.service))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                } }
            })
        };
        let id_param = json!([{
            "name": "id", "in": "path", "required": true,
            "schema": { "type": "integer", "format": "int64" }
        }]);
        let body = json!({
            "required": true,
            "content": {
                "application/x-www-form-urlencoded": {
                    "schema": { "$ref": "#/components/schemas/BookFields" }
                },
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookFields" }
                }
            }
        });
        let ack = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookAck" }
                } }
            })
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "page", "in": "query", "schema": { "type": "integer", "minimum": 1 } },
                            { "name": "status_id", "in": "query", "schema": { "type": "integer" } },
                            { "name": "title", "in": "query", "schema": { "type": "string" } },
                            { "name": "author", "in": "query", "schema": { "type": "string" } },
                            { "name": "search", "in": "query", "schema": { "type": "string" } },
                            { "name": "sort", "in": "query", "schema": {
                                "type": "string",
                                "enum": ["id", "title", "author", "created_at", "updated_at"]
                            } },
                            { "name": "order", "in": "query", "schema": { "type": "string", "enum": ["asc", "desc"] } }
                        ],
                        "responses": {
                            "200": {
                                "description": "One page of books",
                                "content": { "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookPage" }
                                } }
                            },
                            "400": error("Malformed query")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": body.clone(),
                        "responses": {
                            "201": {
                                "description": "Book created",
                                "content": { "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookEnvelope" }
                                } }
                            },
                            "400": error("Validation or storage failure")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Show a book",
                        "tags": ["Books"],
                        "parameters": id_param.clone(),
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": { "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookEnvelope" }
                                } }
                            },
                            "404": error("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Replace a book's fields",
                        "tags": ["Books"],
                        "parameters": id_param.clone(),
                        "requestBody": body.clone(),
                        "responses": {
                            "200": ack("Book updated"),
                            "400": error("Validation or storage failure"),
                            "404": error("Book not found")
                        }
                    },
                    "patch": {
                        "summary": "Replace a book's fields",
                        "tags": ["Books"],
                        "parameters": id_param.clone(),
                        "requestBody": body,
                        "responses": {
                            "200": ack("Book updated"),
                            "400": error("Validation or storage failure"),
                            "404": error("Book not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": id_param.clone(),
                        "responses": {
                            "200": ack("Book deleted"),
                            "404": error("Book not found or already deleted")
                        }
                    }
                },
                "/{id}/edit": {
                    "get": {
                        "summary": "Show a book for editing",
                        "tags": ["Books"],
                        "parameters": id_param,
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": { "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookEnvelope" }
                                } }
                            },
                            "404": error("Book not found")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "status_id": { "type": "integer", "format": "int64" },
                            "status": { "type": ["string", "null"] },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "description": { "type": "string" },
                            "created_at": { "type": "string", "format": "date-time" },
                            "updated_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "status_id", "title", "author", "description", "created_at", "updated_at"]
                    },
                    "BookFields": {
                        "type": "object",
                        "properties": {
                            "status_id": { "type": "integer" },
                            "title": { "type": "string", "minLength": 10, "maxLength": 60 },
                            "author": { "type": "string", "minLength": 10, "maxLength": 200 },
                            "description": { "type": "string", "minLength": 10, "maxLength": 200 }
                        },
                        "required": ["status_id", "title", "author", "description"]
                    },
                    "BookEnvelope": {
                        "type": "object",
                        "properties": {
                            "data": { "$ref": "#/components/schemas/Book" },
                            "message": { "type": "string" }
                        },
                        "required": ["data"]
                    },
                    "BookAck": {
                        "type": "object",
                        "properties": {
                            "data": {
                                "type": "object",
                                "properties": { "id": { "type": "integer", "format": "int64" } },
                                "required": ["id"]
                            },
                            "message": { "type": "string" }
                        },
                        "required": ["data"]
                    },
                    "BookPage": {
                        "type": "object",
                        "properties": {
                            "data": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                            "paginate": { "$ref": "#/components/schemas/Paginate" }
                        },
                        "required": ["data", "paginate"]
                    },
                    "Paginate": {
                        "type": "object",
                        "properties": {
                            "current_page": { "type": "integer" },
                            "per_page": { "type": "integer" },
                            "total_count": { "type": "integer" },
                            "total_pages": { "type": "integer" },
                            "first_page": { "type": "integer" },
                            "last_page": { "type": "integer" },
                            "previous_page": { "type": ["integer", "null"] },
                            "next_page": { "type": ["integer", "null"] }
                        },
                        "required": ["current_page", "per_page", "total_count", "total_pages"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        Self::schema()
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module backed by the given pool
pub fn create_module(pool: SqlitePool, pager: PagerSettings) -> Arc<dyn Module> {
    let repository = Arc::new(SqlBookRepository::new(pool));
    Arc::new(BooksModule::new(Arc::new(BookService::new(
        repository, pager,
    ))))
}
