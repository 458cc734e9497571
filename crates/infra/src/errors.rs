//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use shomer_domain::ShomerError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ShomerError);

impl From<InfraError> for ShomerError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ShomerError> for InfraError {
    fn from(value: ShomerError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoShomerError {
    fn into_shomer(self) -> ShomerError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → ShomerError */
/* -------------------------------------------------------------------------- */

impl IntoShomerError for SqlError {
    fn into_shomer(self) -> ShomerError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        fn looks_like_wrong_key(message: &str) -> bool {
            let lower = message.to_ascii_lowercase();
            lower.contains("not a database") || lower.contains("encrypted")
        }

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => ShomerError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        ShomerError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        ShomerError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        ShomerError::Database("foreign key constraint violation".into())
                    }
                    (_, _) if looks_like_wrong_key(&message) => ShomerError::Security(
                        "SQLCipher key rejected or database not encrypted".into(),
                    ),
                    _ => ShomerError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => ShomerError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                ShomerError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                ShomerError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => ShomerError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                ShomerError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => {
                ShomerError::Database(format!("invalid database path: {}", path.to_string_lossy()))
            }
            RE::InvalidQuery => ShomerError::Database("invalid SQL query".into()),
            other => ShomerError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_shomer())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → ShomerError */
/* -------------------------------------------------------------------------- */

impl IntoShomerError for r2d2::Error {
    fn into_shomer(self) -> ShomerError {
        ShomerError::Database(format!("connection pool error: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_shomer())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ShomerError */
/* -------------------------------------------------------------------------- */

impl IntoShomerError for HttpError {
    fn into_shomer(self) -> ShomerError {
        if self.is_timeout() {
            return ShomerError::Network("HTTP request timed out".into());
        }
        if self.is_connect() {
            return ShomerError::Network(format!("failed to connect: {self}"));
        }
        if let Some(status) = self.status() {
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return ShomerError::Auth(format!("request rejected with status {status}"));
            }
            return ShomerError::Platform(format!("request failed with status {status}"));
        }
        ShomerError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_shomer())
    }
}
