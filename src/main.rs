use anyhow::Context;
use bookshelf::App;
use bookshelf_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;

    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.path,
        "bookshelf bootstrap starting"
    );

    let app = App::bootstrap(&settings).await?;

    tracing::info!("bookshelf bootstrap complete");

    app.run(&settings).await
}
