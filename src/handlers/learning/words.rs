use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use validator::Validate;

use diesel::OptionalExtension;

use crate::{
    data::models::{
        FlagRequest, NoteRequest, ProgressRecord, ResetRequest, ReviewOutcome, SrsError, UserId,
        WordId, WordWithExamples,
    },
    data::repositories::{ExampleRepository, WordRepository},
    handlers::learning::{blocking, AppState},
};

pub async fn record_review(
    State(state): State<AppState>,
    Path((user_id, word_id)): Path<(UserId, WordId)>,
    Json(outcome): Json<ReviewOutcome>,
) -> Result<Json<ProgressRecord>, SrsError> {
    let record = blocking(move || {
        let now = Utc::now();
        let record = state
            .service
            .record_word_review(user_id, word_id, &outcome, now)?;

        // The review itself is already stored; a failed streak update only loses activity.
        let newly_mastered = record.mastered_at == Some(now);
        if let Err(e) = state.activity.record_review(user_id, newly_mastered, now) {
            log::error!("Failed to record activity of user {}: {}", user_id, e);
        }
        Ok(record)
    })
    .await?;

    Ok(Json(record))
}

pub async fn set_flag(
    State(state): State<AppState>,
    Path((user_id, word_id)): Path<(UserId, WordId)>,
    Json(request): Json<FlagRequest>,
) -> Result<Json<ProgressRecord>, SrsError> {
    let record =
        blocking(move || state.service.set_flagged(user_id, word_id, request.value)).await?;
    Ok(Json(record))
}

pub async fn set_favorite(
    State(state): State<AppState>,
    Path((user_id, word_id)): Path<(UserId, WordId)>,
    Json(request): Json<FlagRequest>,
) -> Result<Json<ProgressRecord>, SrsError> {
    let record =
        blocking(move || state.service.set_favorite(user_id, word_id, request.value)).await?;
    Ok(Json(record))
}

pub async fn set_note(
    State(state): State<AppState>,
    Path((user_id, word_id)): Path<(UserId, WordId)>,
    Json(request): Json<NoteRequest>,
) -> Result<Json<ProgressRecord>, SrsError> {
    request.validate()?;

    let record =
        blocking(move || state.service.set_note(user_id, word_id, &request.note)).await?;
    Ok(Json(record))
}

pub async fn word_details(
    State(state): State<AppState>,
    Path(word_id): Path<WordId>,
) -> Result<Json<WordWithExamples>, SrsError> {
    let details = blocking(move || {
        let mut conn = state.pool.get()?;
        let word = WordRepository::find_by_id(&mut conn, word_id)
            .optional()?
            .ok_or(SrsError::WordNotFound(word_id))?;
        let examples = ExampleRepository::by_word(&mut conn, word_id)?;
        Ok(WordWithExamples { word, examples })
    })
    .await?;

    Ok(Json(details))
}

/// `?full=true` also wipes review history.
pub async fn reset(
    State(state): State<AppState>,
    Path((user_id, word_id)): Path<(UserId, WordId)>,
    Query(request): Query<ResetRequest>,
) -> Result<Json<ProgressRecord>, SrsError> {
    let record = blocking(move || {
        if request.full {
            state.service.full_reset_word(user_id, word_id, Utc::now())
        } else {
            state.service.reset_word(user_id, word_id, Utc::now())
        }
    })
    .await?;

    Ok(Json(record))
}
