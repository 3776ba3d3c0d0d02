//! Shared Diesel error mapping for the storefront repositories.
//!
//! Every repository error enum carries `Connection` and `Query` variants; the
//! helpers here translate pool and Diesel failures into those through the
//! constructor functions each repository passes in.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::models::RowError;
use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub(crate) fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
///
/// Driver messages are logged at debug level and never copied into the
/// returned error.
pub(crate) fn map_basic_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

/// Map a row conversion failure into a query error.
pub(crate) fn map_row_error<E, Q>(error: RowError, query: Q) -> E
where
    Q: FnOnce(String) -> E,
{
    debug!(column = error.column, reason = %error.reason, "stored row failed validation");
    query(error.to_string())
}

/// Whether `error` is a unique-constraint violation.
pub(crate) fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// Whether `error` is a foreign-key violation.
pub(crate) fn is_foreign_key_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}

/// Error type for closures run inside `AsyncConnection::transaction`.
///
/// Diesel needs `From<diesel::result::Error>` on the closure's error type;
/// `Domain` carries an already-mapped repository error that should abort the
/// transaction.
#[derive(Debug)]
pub(crate) enum TxError<E> {
    Diesel(DieselError),
    Domain(E),
}

impl<E> From<DieselError> for TxError<E> {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl<E> TxError<E> {
    /// Collapse into the repository error, mapping Diesel failures with `map`.
    pub(crate) fn into_repository_error(self, map: impl FnOnce(DieselError) -> E) -> E {
        match self {
            Self::Diesel(error) => map(error),
            Self::Domain(error) => error,
        }
    }
}
