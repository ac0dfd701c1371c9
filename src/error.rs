use actix_web::error::{BlockingError, ResponseError};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use derive_more::Display;
use diesel::r2d2;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::convert::From;

use super::api::{ApiResponse, ResponseStatus};

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Display)]
pub enum Error {
    /// A required field is missing or could not be parsed.
    #[display(fmt = "{}", _0)]
    ValidationError(String),

    /// The named entity does not exist.
    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),

    /// The store rejected a write because of an integrity constraint.
    #[display(fmt = "Constraint violation: {}", _0)]
    ConstraintViolation(String),

    /// A location cannot be deleted while beverages still reference it.
    #[display(
        fmt = "Location {} still holds {} beverage(s) and can't be deleted",
        location_id,
        beverages
    )]
    HasDependents { location_id: i32, beverages: i64 },

    #[display(fmt = "Storage unavailable: {}", _0)]
    StorageUnavailable(String),

    #[display(fmt = "Query failed: {}", _0)]
    QueryError(DieselError),

    #[display(fmt = "Invalid configuration: {}", _0)]
    ConfigError(String),

    #[display(fmt = "I/O error: {}", _0)]
    Io(std::io::Error),

    #[display(fmt = "Blocking task canceled")]
    Canceled,
}

impl Error {
    /// Whether the user can recover from this error by changing their input.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::ValidationError(_)
            | Self::NotFound(_)
            | Self::ConstraintViolation(_)
            | Self::HasDependents { .. } => true,
            _ => false,
        }
    }

    /// The message shown to the user. Server-side faults get a generic message;
    /// the detail only goes to the log.
    fn public_message(&self) -> String {
        match self {
            Self::ConstraintViolation(_) => {
                "The change wasn't saved because it conflicts with existing data.".to_owned()
            }
            Self::StorageUnavailable(_) => "The database is currently unavailable.".to_owned(),
            e if e.is_client_error() => e.to_string(),
            _ => "An internal error occurred.".to_owned(),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::QueryError(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ConstraintViolation(_) | Self::HasDependents { .. } => StatusCode::CONFLICT,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::QueryError(_) | Self::ConfigError(_) | Self::Io(_) | Self::Canceled => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = if self.is_client_error() {
            match self {
                Self::ConstraintViolation(_) => warn!("{}", self),
                _ => debug!("{}", self),
            }
            ResponseStatus::Fail
        } else {
            error!("{}", self);
            ResponseStatus::Error
        };

        HttpResponse::build(self.status_code())
            .json(ApiResponse::failure(status, self.public_message()))
    }
}

impl From<DieselError> for Error {
    fn from(e: DieselError) -> Error {
        match e {
            DieselError::NotFound => Error::NotFound("Record"),
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation => {
                    Error::ConstraintViolation(info.message().to_owned())
                }
                _ => Error::QueryError(DieselError::DatabaseError(kind, info)),
            },
            e => Error::QueryError(e),
        }
    }
}

impl From<r2d2::PoolError> for Error {
    fn from(e: r2d2::PoolError) -> Error {
        Error::StorageUnavailable(e.to_string())
    }
}

impl From<BlockingError> for Error {
    fn from(_: BlockingError) -> Error {
        Error::Canceled
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}
