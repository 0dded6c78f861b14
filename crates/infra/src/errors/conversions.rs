//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use roost_domain::RoostError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub RoostError);

impl From<InfraError> for RoostError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<RoostError> for InfraError {
    fn from(value: RoostError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoRoostError {
    fn into_roost(self) -> RoostError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → RoostError */
/* -------------------------------------------------------------------------- */

impl IntoRoostError for SqlError {
    fn into_roost(self) -> RoostError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        RoostError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        RoostError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        RoostError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        RoostError::Database("foreign key constraint violation".into())
                    }
                    _ => RoostError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => RoostError::Database("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                RoostError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                RoostError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => RoostError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                RoostError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => {
                RoostError::Database(format!("invalid database path: {}", path.to_string_lossy()))
            }
            RE::InvalidQuery => RoostError::Database("invalid SQL query".into()),
            other => RoostError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_roost())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → RoostError */
/* -------------------------------------------------------------------------- */

impl IntoRoostError for r2d2::Error {
    fn into_roost(self) -> RoostError {
        RoostError::Database(format!("connection pool error: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_roost())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RoostError */
/* -------------------------------------------------------------------------- */

impl IntoRoostError for HttpError {
    fn into_roost(self) -> RoostError {
        if self.is_timeout() {
            return RoostError::FeedUnavailable("request timed out".into());
        }

        if self.is_connect() {
            return RoostError::FeedUnavailable("connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            return RoostError::FeedUnavailable(format!(
                "HTTP {} {}",
                code,
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        RoostError::FeedUnavailable(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_roost())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
