//! Project-specific utilities live here.

pub mod pagination;
pub mod sanitize;

pub use pagination::{ListResponse, Paginate};
pub use sanitize::sanitize_special_chars;
