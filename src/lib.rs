//! Bookshelf application library
//!
//! Wires the books module, the shared database handle and the module lifecycle
//! into a runnable application.

pub mod modules;

use anyhow::Context;
use axum::Router;
use bookshelf_db::Database;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// A bootstrapped application: database open, migrations applied, modules started.
pub struct App {
    pub db: Database,
    pub registry: ModuleRegistry,
}

impl App {
    /// Open storage, register modules and run init, migrate and start in order.
    pub async fn bootstrap(settings: &Settings) -> anyhow::Result<Self> {
        let db = Database::open(&settings.database.path)
            .await
            .context("failed to open database")?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &db);

        let ctx = InitCtx {
            settings,
            db: &db,
        };

        registry.init_modules(&ctx).await?;

        let applied = db
            .migrate(registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, "migrations complete");

        registry.start_modules(&ctx).await?;

        Ok(Self { db, registry })
    }

    /// Router serving every registered module.
    pub fn router(&self, settings: &Settings) -> Router {
        bookshelf_http::build_router(&self.registry, settings)
    }

    /// Serve HTTP until a shutdown signal, then stop modules.
    pub async fn run(self, settings: &Settings) -> anyhow::Result<()> {
        let served = bookshelf_http::start_server(&self.registry, settings).await;
        self.registry.stop_modules().await?;
        served
    }
}
