pub mod users;
pub mod words;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::config::Settings;
use crate::data::models::SrsError;
use crate::data::repositories::DieselProgressStore;
use crate::features::learning::{ActivityTracker, LearningService, SessionPlanner};
use crate::features::vocabulary::CatalogWordSupply;
use crate::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub service: Arc<LearningService<DieselProgressStore>>,
    pub planner: Arc<SessionPlanner<DieselProgressStore, CatalogWordSupply>>,
    pub activity: ActivityTracker,
    pub settings: Settings,
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/users", post(users::create_user))
        .route(
            "/users/{user_id}",
            get(users::profile).patch(users::update_preferences),
        )
        .route("/users/{user_id}/session", get(users::daily_session))
        .route("/users/{user_id}/due", get(users::due_words))
        .route("/users/{user_id}/statistics", get(users::statistics))
        .route("/users/{user_id}/words", get(users::progress))
        .route("/users/{user_id}/words/{word_id}/review", post(words::record_review))
        .route("/users/{user_id}/words/{word_id}/flag", post(words::set_flag))
        .route("/users/{user_id}/words/{word_id}/favorite", post(words::set_favorite))
        .route("/users/{user_id}/words/{word_id}/note", post(words::set_note))
        .route("/users/{user_id}/words/{word_id}/reset", post(words::reset))
        .route("/words/{word_id}", get(words::word_details))
        .with_state(state)
}

/// Runs store work off the async executor.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, SrsError>
where
    F: FnOnce() -> Result<T, SrsError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        log::error!("Blocking task failed: {}", e);
        SrsError::StoreUnavailable("Worker task failed".into())
    })?
}
