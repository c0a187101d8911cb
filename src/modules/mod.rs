pub mod books;

use bookshelf_kernel::{settings::Settings, ModuleRegistry};
use sqlx::SqlitePool;

/// Register all project-specific modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    db: &SqlitePool,
    settings: &Settings,
) -> anyhow::Result<()> {
    registry.register(books::create_module(db.clone(), settings.pager.clone()))?;
    Ok(())
}
