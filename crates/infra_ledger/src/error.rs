//! Ledger adapter error types
//!
//! Adapters report `LedgerError` internally and translate it to
//! [`PortError`] at the port boundary.

use thiserror::Error;

use core_kernel::PortError;

/// Errors raised by the ledger adapters
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Failed to establish a database connection
    #[error("Failed to connect to ledger database: {0}")]
    ConnectionFailed(String),

    /// Statement execution failed
    #[error("Ledger query failed: {0}")]
    QueryFailed(String),

    /// A write batch could not be committed
    #[error("Ledger transaction failed: {0}")]
    TransactionFailed(String),

    /// Schema setup failed
    #[error("Ledger schema setup failed: {0}")]
    SchemaFailed(String),

    /// No pooled connection became available in time
    #[error("Ledger connection pool exhausted")]
    PoolExhausted,

    /// Generic SQL error
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

impl LedgerError {
    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            LedgerError::ConnectionFailed(_) | LedgerError::PoolExhausted
        )
    }
}

impl From<&sqlx::Error> for LedgerError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => LedgerError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                LedgerError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::Database(db_err) => LedgerError::QueryFailed(db_err.message().to_string()),
            _ => LedgerError::QueryFailed(error.to_string()),
        }
    }
}

impl From<LedgerError> for PortError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::SqlError(source) => {
                let classified = LedgerError::from(&source);
                if classified.is_connection_error() {
                    PortError::Connection {
                        message: classified.to_string(),
                        source: Some(Box::new(source)),
                    }
                } else {
                    PortError::internal_with_source(classified.to_string(), source)
                }
            }
            e if e.is_connection_error() => PortError::connection(e.to_string()),
            e => PortError::internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_transient_port_error() {
        let port: PortError = LedgerError::SqlError(sqlx::Error::PoolTimedOut).into();
        assert!(port.is_transient());
        assert!(port.to_string().contains("pool exhausted"));
    }

    #[test]
    fn test_query_failure_is_internal() {
        let port: PortError = LedgerError::QueryFailed("syntax error".to_string()).into();
        assert!(matches!(port, PortError::Internal { .. }));
        assert!(!port.is_transient());
    }

    #[test]
    fn test_connection_failure_maps_to_connection() {
        let port: PortError = LedgerError::ConnectionFailed("refused".to_string()).into();
        assert!(matches!(port, PortError::Connection { .. }));
    }
}
