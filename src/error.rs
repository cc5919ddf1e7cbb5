use std::io;

use thiserror::Error;

use crate::grants::engine::ApplyError;
use crate::grants::PrivilegeKind;
use crate::session::SessionError;

/// Errors returned by every `oragrant` operation.
#[derive(Debug, Error)]
pub enum Error {
    /// The authority rejected a query or single statement, or the connection failed.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// A reconcile stopped part-way through its operation list.
    #[error(transparent)]
    Apply(Box<ApplyError>),
    /// An identifier cannot be rendered into statement text.
    #[error("invalid identifier `{name}`: {reason}")]
    InvalidIdentifier {
        /// The identifier as supplied.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// A privilege string cannot be rendered for its domain.
    #[error("invalid privilege `{privilege}` for {domain} grants: {reason}")]
    InvalidPrivilege {
        /// The privilege as supplied.
        privilege: String,
        /// Domain the privilege was requested for.
        domain: PrivilegeKind,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// A password or path literal cannot be rendered.
    #[error("invalid literal: {0}")]
    InvalidLiteral(&'static str),
    /// A catalog row did not have the expected shape.
    #[error("unexpected catalog row: {0}")]
    Decode(String),
    /// A read targeted an entity the catalog does not hold.
    #[error("{kind} `{name}` does not exist")]
    NotFound {
        /// Entity kind (`user`, `role`, `directory`).
        kind: &'static str,
        /// Name as looked up.
        name: String,
    },
    /// A manifest or snapshot document is structurally valid JSON but semantically wrong.
    #[error("manifest error: {0}")]
    Manifest(String),
    /// An output artifact name or location was rejected.
    #[error("invalid output: {0}")]
    Output(String),
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A JSON document failed to parse.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ApplyError> for Error {
    fn from(value: ApplyError) -> Self {
        Error::Apply(Box::new(value))
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
