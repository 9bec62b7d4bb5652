use actix_web::HttpServer;
use anyhow::Context;
use env_logger::Env;
use std::sync::Arc;
use timeslot::app_config::AppConfig;
use timeslot::ident::IdGenerator;
use timeslot::oauth::{GoogleProvider, OAuthConfig};
use timeslot::rate_limit::CLEANUP_INTERVAL;
use timeslot::store::{PgRepository, Repository};
use timeslot::{build_app, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let credentials = config
        .oauth_credentials()
        .context("Failed to load oauth2 google credentials")?;

    let db = sea_orm::Database::connect(config.database_url.as_str())
        .await
        .context("Failed to connect to the database")?;
    let repo: Arc<dyn Repository> = Arc::new(PgRepository::new(db));

    let provider = GoogleProvider::new(
        OAuthConfig::google(&credentials, config.redirect_url()),
        config.http_timeout(),
    )
    .context("Failed to build the identity provider client")?;

    let state = AppState::new(
        &config,
        repo,
        Arc::new(provider),
        Arc::new(IdGenerator::from_entropy()),
    );

    // Spawn rate limiter cleanup task
    let limiter = state.limiter.clone();
    let window = state.rate_limit.window;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.cleanup_old_entries(window);
            log::debug!(
                "Rate limiter cleanup completed, {} keys tracked",
                limiter.tracked_keys_count()
            );
        }
    });

    log::info!("Listening on 0.0.0.0:{} as {}", config.port, config.base_url);

    HttpServer::new(move || build_app(state.clone()))
        .bind(("0.0.0.0", config.port))?
        .run()
        .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env file is fine; the environment may already be set.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
