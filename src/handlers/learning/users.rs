use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    data::models::{
        CreateUserRequest, DailySession, LearningStatistics, LearningStatus, NewUser,
        PreferencesChangeset, ProgressEntry, ProgressQuery, ProgressRecord, SrsError,
        UpdatePreferencesRequest, UserId, UserProfile,
    },
    data::repositories::UserRepository,
    handlers::learning::{blocking, AppState},
    spaced_repetition_system::SrsEngine,
    DbPool,
};

pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), SrsError> {
    request.validate()?;

    let profile = blocking(move || {
        let mut conn = state.pool.get()?;
        let difficulty = request
            .difficulty_level
            .unwrap_or_else(|| state.settings.default_difficulty.clone());

        let new_user = NewUser {
            daily_word_count: request
                .daily_word_count
                .unwrap_or(state.settings.daily_word_count),
            difficulty_level: &difficulty,
            language_code: request.language_code.as_deref(),
            is_active: true,
            notifications_enabled: request.notifications_enabled,
            created_at: Utc::now().naive_utc(),
        };

        UserRepository::create_user(&mut conn, &new_user).map_err(|e| {
            log::error!("User creation failed: {}", e);
            SrsError::from(e)
        })
    })
    .await?;

    log::info!("Created user {}", profile.id);
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserProfile>, SrsError> {
    let profile = blocking(move || load_profile(&state.pool, user_id)).await?;
    Ok(Json(profile))
}

/// Only the fields present in the body change.
pub async fn update_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(request): Json<UpdatePreferencesRequest>,
) -> Result<Json<UserProfile>, SrsError> {
    request.validate()?;

    let profile = blocking(move || {
        let mut conn = state.pool.get()?;
        UserRepository::update_preferences(
            &mut conn,
            user_id,
            &PreferencesChangeset::from(&request),
        )?
        .ok_or(SrsError::UserNotFound(user_id))
    })
    .await?;

    log::info!("Updated preferences of user {}", user_id);
    Ok(Json(profile))
}

pub async fn daily_session(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<DailySession>, SrsError> {
    let session = blocking(move || {
        let profile = load_profile(&state.pool, user_id)?;
        state
            .planner
            .plan_daily_session(&profile, profile.daily_word_count, Utc::now())
    })
    .await?;

    Ok(Json(session))
}

pub async fn due_words(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<ProgressRecord>>, SrsError> {
    let due = blocking(move || {
        load_profile(&state.pool, user_id)?;
        state.service.words_due(user_id, Utc::now())
    })
    .await?;

    Ok(Json(due))
}

pub async fn statistics(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<LearningStatistics>, SrsError> {
    let stats = blocking(move || {
        load_profile(&state.pool, user_id)?;
        state.service.statistics(user_id, Utc::now())
    })
    .await?;

    Ok(Json(stats))
}

/// `?status=` narrows the list to one learning stage.
pub async fn progress(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<Vec<ProgressEntry>>, SrsError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<LearningStatus>)
        .transpose()?;

    let entries = blocking(move || {
        load_profile(&state.pool, user_id)?;
        let records = match status {
            Some(status) => state.service.progress_by_status(user_id, status)?,
            None => state.service.all_progress(user_id)?,
        };

        let now = Utc::now();
        Ok(records
            .into_iter()
            .map(|record| ProgressEntry {
                days_until_review: SrsEngine::days_until_review(&record, now),
                record,
            })
            .collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(entries))
}

fn load_profile(pool: &DbPool, user_id: UserId) -> Result<UserProfile, SrsError> {
    let mut conn = pool.get()?;
    UserRepository::find_by_id(&mut conn, user_id)?.ok_or(SrsError::UserNotFound(user_id))
}
