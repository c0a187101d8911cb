//! Composable filters applied to book queries before fetching or listing.
//!
//! A [`Criterion`] refines a [`BookQuery`]; the repository applies criteria in
//! sequence and renders the result to SQL with bound parameters.

use std::sync::Arc;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    StatusId,
    Title,
    Author,
    Description,
    CreatedAt,
    UpdatedAt,
    /// Primary key of the joined status row
    StatusKey,
}

impl Column {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Column::Id => "books.id",
            Column::StatusId => "books.status_id",
            Column::Title => "books.title",
            Column::Author => "books.author",
            Column::Description => "books.description",
            Column::CreatedAt => "books.created_at",
            Column::UpdatedAt => "books.updated_at",
            Column::StatusKey => "status.id",
        }
    }

    /// Columns a client may sort by.
    fn sortable(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Column::Id),
            "title" => Some(Column::Title),
            "author" => Some(Column::Author),
            "created_at" => Some(Column::CreatedAt),
            "updated_at" => Some(Column::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    EqInt(Column, i64),
    /// Substring match
    Contains(Column, String),
    /// Substring match against any of the columns
    ContainsAny(Vec<Column>, String),
    NotNull(Column),
}

/// Accumulated filter and ordering state for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub conditions: Vec<Condition>,
    pub order_by: Option<(Column, SortOrder)>,
}

impl BookQuery {
    pub fn filter(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }
}

pub type Criterion = Arc<dyn Fn(&mut BookQuery) + Send + Sync>;

/// Fold criteria, in order, into a single query description.
pub fn apply(criteria: &[Criterion]) -> BookQuery {
    let mut query = BookQuery::default();
    for criterion in criteria {
        criterion(&mut query);
    }
    query
}

/// Query-string parameters accepted by the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub status_id: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Request-driven filters: exact status, title/author/search substrings, sort.
pub fn scope(params: &ListParams) -> Criterion {
    let status_id = params.status_id;
    let title = non_blank(&params.title);
    let author = non_blank(&params.author);
    let search = non_blank(&params.search);
    let order_by = params
        .sort
        .as_deref()
        .and_then(Column::sortable)
        .map(|column| (column, params.order.unwrap_or_default()));

    Arc::new(move |query: &mut BookQuery| {
        if let Some(status_id) = status_id {
            query.filter(Condition::EqInt(Column::StatusId, status_id));
        }
        if let Some(title) = &title {
            query.filter(Condition::Contains(Column::Title, title.clone()));
        }
        if let Some(author) = &author {
            query.filter(Condition::Contains(Column::Author, author.clone()));
        }
        if let Some(search) = &search {
            query.filter(Condition::ContainsAny(
                vec![Column::Title, Column::Author, Column::Description],
                search.clone(),
            ));
        }
        if order_by.is_some() {
            query.order_by = order_by;
        }
    })
}

/// Only books whose status resolves, ordered by id unless already ordered.
pub fn book_criteria() -> Criterion {
    Arc::new(|query: &mut BookQuery| {
        query.filter(Condition::NotNull(Column::StatusKey));
        if query.order_by.is_none() {
            query.order_by = Some((Column::Id, SortOrder::Asc));
        }
    })
}
