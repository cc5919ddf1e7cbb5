//! Reconcile Oracle users, roles, directories and privilege grants against a declared desired state.
#![warn(missing_docs)]

pub mod catalog;
/// The [`Client`] entry point bound to an injected session.
pub mod client;
pub mod converge;
pub mod directory;
/// Crate error type.
pub mod error;
pub mod grants;
pub mod manifest;
pub mod memory;
/// Plan script and drift report output.
pub mod output;
pub mod principal;
/// The database session seam: statement execution and catalog queries.
pub mod session;
/// Rendering of identifiers, privileges and literals into statement text.
pub mod sql;

pub use client::Client;
pub use error::{Error, Result};
pub use grants::{GrantsMode, Privilege, PrivilegeGrant, PrivilegeKind, Target};
pub use memory::MemoryAuthority;
pub use session::{Row, Session, SessionError};
