//! Application wiring shared by the server binary and the CLI.

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

use crate::modules;

/// Open the database and register every module against it.
pub async fn prepare(settings: &Settings) -> anyhow::Result<(SqlitePool, ModuleRegistry)> {
    let pool = bookshelf_db::connect(&settings.database)
        .await
        .context("failed to connect to database")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &pool, settings)?;

    Ok((pool, registry))
}

/// Apply pending module migrations and return how many ran.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let (pool, registry) = prepare(settings).await?;
    apply_migrations(&pool, &registry).await
}

async fn apply_migrations(pool: &SqlitePool, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    let applied = bookshelf_db::migrate(pool, &registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, "migrations complete");
    Ok(applied)
}

/// Migrate, run the module lifecycle, and serve HTTP until shutdown.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let (pool, registry) = prepare(settings).await?;
    apply_migrations(&pool, &registry).await?;

    let ctx = InitCtx {
        settings,
        db: &pool,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("bookshelf bootstrap complete");
    let served = bookshelf_http::start_server(&registry, settings).await;

    registry.stop_all().await?;
    pool.close().await;
    served
}

/// Method and path of every documented route, sorted by path.
pub fn route_table(settings: &Settings) -> anyhow::Result<Vec<(String, String)>> {
    let pool = bookshelf_db::connect_lazy(&settings.database)?;
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &pool, settings)?;

    let spec = bookshelf_http::router::merge_openapi(&registry);
    let mut routes = Vec::new();
    if let Some(paths) = spec["paths"].as_object() {
        for (path, item) in paths {
            if let Some(methods) = item.as_object() {
                for method in methods.keys() {
                    routes.push((method.to_uppercase(), path.clone()));
                }
            }
        }
    }
    routes.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    Ok(routes)
}
