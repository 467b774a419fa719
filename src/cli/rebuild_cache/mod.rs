//! Rebuild-cache command - recomputes every artifact from the store

use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    let state = crate::create_app_state_with_config(&config).await?;
    let rebuilt = state.admin_service.rebuild_all().await?;

    info!(games = rebuilt, "Configuration cache rebuilt");
    println!("Rebuilt cache for {} game(s)", rebuilt);

    Ok(())
}
