use diesel::result::{DatabaseErrorKind, Error as DieselError};
use validator::ValidationErrors;

use crate::data::models::SrsError;

impl From<DieselError> for SrsError {
    fn from(err: DieselError) -> Self {
        match &err {
            // SQLite reports an expired busy_timeout as a generic "database is locked".
            DieselError::DatabaseError(DatabaseErrorKind::Unknown, info)
                if info.message().contains("locked") || info.message().contains("busy") =>
            {
                SrsError::StoreUnavailable(info.message().to_string())
            }
            _ => SrsError::Database(err),
        }
    }
}

impl From<r2d2::Error> for SrsError {
    fn from(err: r2d2::Error) -> Self {
        SrsError::StoreUnavailable(err.to_string())
    }
}

impl From<ValidationErrors> for SrsError {
    fn from(err: ValidationErrors) -> Self {
        SrsError::InvalidArgument(err.to_string())
    }
}
