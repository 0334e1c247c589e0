pub mod learning_models;
pub mod srs_models;
pub mod user_models;
pub mod word_models;

pub use learning_models::{
    DailySession, FlagRequest, LearningStatistics, NoteRequest, ProgressEntry, ProgressQuery,
    ResetRequest, SrsError,
};
pub use srs_models::{
    LearningStatus, NewProgress, ProgressRecord, ProgressRow, ReviewOutcome, UserId, WordId,
    INITIAL_EASE_FACTOR, MAX_EASE_FACTOR, MAX_NOTE_LENGTH, MIN_EASE_FACTOR,
};
pub use user_models::{
    CreateUserRequest, NewUser, PreferencesChangeset, UpdatePreferencesRequest, UserProfile,
};
pub use word_models::{
    Example, GeneratedExample, GeneratedWord, NewExample, NewWord, Word, WordWithExamples,
};
