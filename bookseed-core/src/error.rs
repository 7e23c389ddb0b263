//! Structured error types for bookseed-core.
//!
//! Uses `thiserror` so the binary can match on failure classes,
//! while still composing with `anyhow` at the top level.

use std::path::PathBuf;

use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::schema::Table;

/// Coarse failure class of a provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Environment misconfigured or server unreachable
    Connection,
    /// A `CREATE TABLE` statement failed
    Schema,
    /// An insert violated a key or not-null constraint
    Constraint,
    /// Reading back a table failed
    Query,
}

/// Main error type for bookseed-core operations
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Required environment variable is not set
    #[error("Missing required environment variable {name}")]
    MissingVar { name: &'static str },

    /// `DB_PORT` is not a valid TCP port
    #[error("Invalid database port '{value}': expected an integer between 0 and 65535")]
    InvalidPort { value: String },

    /// Explicit env file could not be read
    #[error("Failed to load env file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },

    /// Server unreachable or credentials rejected
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        target: String,
        source: sqlx::Error,
    },

    /// Beginning, committing or rolling back the seed transaction failed
    #[error("Failed to {action} seed transaction: {source}")]
    Transaction {
        action: &'static str,
        source: sqlx::Error,
    },

    /// Closing the connection failed
    #[error("Failed to close database connection: {source}")]
    Disconnect { source: sqlx::Error },

    /// DDL statement failed, e.g. the table already exists
    #[error("Failed to create table {table}: {source}")]
    Schema { table: Table, source: sqlx::Error },

    /// Insert rejected by a primary-key, foreign-key or not-null constraint
    #[error("Constraint violation while inserting into {table}: {source}")]
    Constraint { table: Table, source: sqlx::Error },

    /// Any other insert failure
    #[error("Failed to insert into {table}: {source}")]
    Statement { table: Table, source: sqlx::Error },

    /// Reading a table back failed
    #[error("Failed to read {table}: {source}")]
    Query { table: Table, source: sqlx::Error },
}

/// Result type alias for bookseed-core operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

impl ProvisionError {
    /// Map an insert failure onto `Constraint` or `Statement`.
    pub fn from_insert(table: Table, source: sqlx::Error) -> Self {
        let violated = source
            .as_database_error()
            .map(|db| is_constraint_kind(db.kind()))
            .unwrap_or(false);

        if violated {
            Self::Constraint { table, source }
        } else {
            Self::Statement { table, source }
        }
    }

    /// Failure class, collapsing the variants onto the four phases.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingVar { .. }
            | Self::InvalidPort { .. }
            | Self::EnvFile { .. }
            | Self::Connect { .. }
            | Self::Transaction { .. }
            | Self::Disconnect { .. } => ErrorClass::Connection,
            Self::Schema { .. } => ErrorClass::Schema,
            Self::Constraint { .. } | Self::Statement { .. } => ErrorClass::Constraint,
            Self::Query { .. } => ErrorClass::Query,
        }
    }

    /// Table the failing statement targeted, if any.
    pub fn table(&self) -> Option<Table> {
        match self {
            Self::Schema { table, .. }
            | Self::Constraint { table, .. }
            | Self::Statement { table, .. }
            | Self::Query { table, .. } => Some(*table),
            _ => None,
        }
    }
}

/// Whether a database error kind is a constraint violation.
pub fn is_constraint_kind(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation
    )
}
