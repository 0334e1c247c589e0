use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use vocala::{
    config::Settings,
    data::database,
    data::repositories::DieselProgressStore,
    features::learning::{ActivityTracker, LearningService, SessionPlanner},
    features::vocabulary::CatalogWordSupply,
    handlers::learning::{api_router, AppState},
    scheduler::DailyDispatcher,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("Invalid configuration")?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_level.as_str()),
    )
    .init();

    let pool = database::connect(&settings).context("Failed to open database")?;

    let store = DieselProgressStore::new(pool.clone());
    let supply = CatalogWordSupply::new(pool.clone());
    let planner = Arc::new(SessionPlanner::new(store.clone(), supply));
    let service = Arc::new(LearningService::new(store, settings.clone()));

    let dispatcher = Arc::new(DailyDispatcher::new(
        pool.clone(),
        Arc::clone(&planner),
        settings.clone(),
    ));
    dispatcher.spawn();

    let state = AppState {
        activity: ActivityTracker::new(pool.clone()),
        pool,
        service,
        planner,
        settings: settings.clone(),
    };

    let app = Router::new()
        .nest("/api", api_router(state))
        .layer(TimeoutLayer::new(settings.request_timeout()));

    let listener = TcpListener::bind(&settings.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", settings.bind_address))?;

    log::info!("Server running on http://{}", settings.bind_address);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
