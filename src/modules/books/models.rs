use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type BookId = i64;

/// Book as projected by list and show, joined with its status label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Unique identifier for the book
    pub id: BookId,
    /// Reference to the book's status
    pub status_id: i64,
    /// Status label, absent when the status row no longer resolves
    pub status: Option<String>,
    pub title: String,
    pub author: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated field set written by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub status_id: i64,
    pub title: String,
    pub author: String,
    pub description: String,
}

/// Acknowledgement body for update and delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookRef {
    pub id: BookId,
}
