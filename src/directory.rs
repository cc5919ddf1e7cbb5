//! Directory objects: named handles onto server file system paths.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::session::{count_positive, Session};
use crate::sql::names::reported_name;
use crate::sql::{self, Statement};

pub(crate) const DIRECTORY_EXISTS_QUERY: &str =
    "SELECT COUNT(*) FROM dba_directories WHERE directory_name = UPPER(:1)";
pub(crate) const READ_DIRECTORY_QUERY: &str = "SELECT directory_name, directory_path \
     FROM dba_directories WHERE directory_name = UPPER(:1)";

/// A directory object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    /// Directory name. Reads report it lower-cased.
    pub name: String,
    /// Server-side path, verbatim.
    pub path: String,
}

impl Directory {
    /// A directory `name` pointing at `path`.
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }
}

/// `CREATE OR REPLACE DIRECTORY` for `directory`.
pub fn create_directory_statement(directory: &Directory) -> Result<Statement> {
    Ok(Statement::new(format!(
        "CREATE OR REPLACE DIRECTORY {} AS {}",
        sql::identifier(&directory.name)?,
        sql::string_literal(&directory.path)?
    )))
}

impl<S: Session> Client<S> {
    /// Create `directory`, or repoint it when it already exists.
    pub fn create_directory(&mut self, directory: &Directory) -> Result<()> {
        self.run(&create_directory_statement(directory)?)?;
        tracing::info!(directory = %directory.name, path = %directory.path, "created directory");
        Ok(())
    }

    /// Drop a directory; grants on it go with it.
    pub fn drop_directory(&mut self, name: &str) -> Result<()> {
        self.run(&Statement::new(format!("DROP DIRECTORY {}", sql::identifier(name)?)))?;
        tracing::info!(directory = %name, "dropped directory");
        Ok(())
    }

    /// True when the directory exists.
    pub fn directory_exists(&mut self, name: &str) -> Result<bool> {
        let bind = sql::bind(name);
        count_positive(self.session_mut(), DIRECTORY_EXISTS_QUERY, &[bind.as_str()])
    }

    /// Read a directory back from the catalog.
    pub fn read_directory(&mut self, name: &str) -> Result<Directory> {
        let bind = sql::bind(name);
        let rows = self.session_mut().query(READ_DIRECTORY_QUERY, &[bind.as_str()])?;
        let Some(row) = rows.first() else {
            return Err(Error::NotFound {
                kind: "directory",
                name: name.to_string(),
            });
        };
        Ok(Directory {
            name: reported_name(row.text(0)?),
            path: row.text(1)?.to_string(),
        })
    }
}
