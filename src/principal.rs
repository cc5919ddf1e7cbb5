//! Users and roles: the principals that hold privileges.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::session::{count_positive, Session};
use crate::sql::{self, Statement};

pub(crate) const USER_EXISTS_QUERY: &str =
    "SELECT COUNT(*) FROM dba_users WHERE username = UPPER(:1)";
pub(crate) const READ_USER_QUERY: &str = "SELECT username, default_tablespace, \
     temporary_tablespace, profile, authentication_type, account_status \
     FROM dba_users WHERE username = UPPER(:1)";
pub(crate) const ROLE_EXISTS_QUERY: &str = "SELECT COUNT(*) FROM dba_roles WHERE role = UPPER(:1)";
pub(crate) const READ_ROLE_QUERY: &str = "SELECT role FROM dba_roles WHERE role = UPPER(:1)";

const REDACTED_PASSWORD: &str = "\"***\"";

/// How a user authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// Database password.
    Password(String),
    /// Operating system or network authentication.
    External,
    /// Enterprise directory authentication.
    Global,
}

/// Account lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountState {
    /// `ACCOUNT LOCK`
    Locked,
    /// `ACCOUNT UNLOCK`
    Unlocked,
}

/// A user to create. Unset attributes take the database defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User name.
    pub username: String,
    /// Authentication clause.
    pub authentication: Authentication,
    /// `DEFAULT TABLESPACE`
    pub default_tablespace: Option<String>,
    /// `TEMPORARY TABLESPACE`
    pub temporary_tablespace: Option<String>,
    /// `PROFILE`
    pub profile: Option<String>,
    /// Only [`AccountState::Locked`] adds a clause on create.
    pub state: Option<AccountState>,
}

impl User {
    /// A password-authenticated user with default attributes.
    pub fn with_password(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            authentication: Authentication::Password(password.to_string()),
            default_tablespace: None,
            temporary_tablespace: None,
            profile: None,
            state: None,
        }
    }
}

/// A partial update of an existing user: only supplied fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    /// User name.
    pub username: String,
    /// New password.
    pub password: Option<String>,
    /// New default tablespace.
    pub default_tablespace: Option<String>,
    /// New temporary tablespace.
    pub temporary_tablespace: Option<String>,
    /// New profile.
    pub profile: Option<String>,
    /// Lock or unlock; `None` leaves the account state alone.
    pub state: Option<AccountState>,
}

impl UserChanges {
    /// No changes yet for `username`.
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            ..Self::default()
        }
    }
}

/// A user as the catalog reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Stored user name.
    pub username: String,
    /// Default tablespace.
    pub default_tablespace: Option<String>,
    /// Temporary tablespace.
    pub temporary_tablespace: Option<String>,
    /// Profile.
    pub profile: Option<String>,
    /// Authentication classification, e.g. `PASSWORD`; never the credential.
    pub authentication_type: Option<String>,
    /// `OPEN`, `LOCKED` and so on.
    pub account_status: Option<String>,
}

/// A role as the catalog reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    /// Stored role name.
    pub name: String,
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Shared attribute clauses of `CREATE USER` and `ALTER USER`.
fn attribute_clauses(
    default_tablespace: &Option<String>,
    temporary_tablespace: &Option<String>,
    profile: &Option<String>,
) -> Result<String> {
    let mut clauses = String::new();
    if let Some(tablespace) = supplied(default_tablespace) {
        clauses.push_str(&format!(" DEFAULT TABLESPACE {}", sql::identifier(tablespace)?));
    }
    if let Some(tablespace) = supplied(temporary_tablespace) {
        clauses.push_str(&format!(" TEMPORARY TABLESPACE {}", sql::identifier(tablespace)?));
    }
    if let Some(profile) = supplied(profile) {
        clauses.push_str(&format!(" PROFILE {}", sql::identifier(profile)?));
    }
    Ok(clauses)
}

/// Build the `CREATE USER` statement for `user`.
pub fn create_user_statement(user: &User) -> Result<Statement> {
    let name = sql::identifier(&user.username)?;
    let (auth, redacted_auth) = match &user.authentication {
        Authentication::Password(password) => (
            format!(" IDENTIFIED BY {}", sql::password(password)?),
            format!(" IDENTIFIED BY {REDACTED_PASSWORD}"),
        ),
        Authentication::External => (" IDENTIFIED EXTERNALLY".into(), " IDENTIFIED EXTERNALLY".into()),
        Authentication::Global => (" IDENTIFIED GLOBALLY".into(), " IDENTIFIED GLOBALLY".into()),
    };

    let mut tail = attribute_clauses(
        &user.default_tablespace,
        &user.temporary_tablespace,
        &user.profile,
    )?;
    if user.state == Some(AccountState::Locked) {
        tail.push_str(" ACCOUNT LOCK");
    }

    Ok(Statement::with_redacted(
        format!("CREATE USER {name}{auth}{tail}"),
        format!("CREATE USER {name}{redacted_auth}{tail}"),
    ))
}

/// Build the `ALTER USER` statement for `changes`; `None` when nothing was supplied.
pub fn modify_user_statement(changes: &UserChanges) -> Result<Option<Statement>> {
    let name = sql::identifier(&changes.username)?;
    let (auth, redacted_auth) = match changes.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => (
            format!(" IDENTIFIED BY {}", sql::password(password)?),
            format!(" IDENTIFIED BY {REDACTED_PASSWORD}"),
        ),
        None => (String::new(), String::new()),
    };

    let mut tail = attribute_clauses(
        &changes.default_tablespace,
        &changes.temporary_tablespace,
        &changes.profile,
    )?;
    match changes.state {
        Some(AccountState::Locked) => tail.push_str(" ACCOUNT LOCK"),
        Some(AccountState::Unlocked) => tail.push_str(" ACCOUNT UNLOCK"),
        None => {}
    }

    if auth.is_empty() && tail.is_empty() {
        return Ok(None);
    }
    Ok(Some(Statement::with_redacted(
        format!("ALTER USER {name}{auth}{tail}"),
        format!("ALTER USER {name}{redacted_auth}{tail}"),
    )))
}

/// Build the `CREATE ROLE` statement for `name`.
pub fn create_role_statement(name: &str) -> Result<Statement> {
    Ok(Statement::new(format!("CREATE ROLE {}", sql::identifier(name)?)))
}

impl<S: Session> Client<S> {
    /// Create a user.
    pub fn create_user(&mut self, user: &User) -> Result<()> {
        let statement = create_user_statement(user)?;
        self.run(&statement)?;
        tracing::info!(username = %user.username, "created user");
        Ok(())
    }

    /// Apply the supplied fields of `changes` to an existing user.
    pub fn modify_user(&mut self, changes: &UserChanges) -> Result<()> {
        let Some(statement) = modify_user_statement(changes)? else {
            tracing::debug!(username = %changes.username, "no user attributes to change");
            return Ok(());
        };
        self.run(&statement)?;
        tracing::info!(username = %changes.username, "modified user");
        Ok(())
    }

    /// Drop a user together with every object it owns.
    pub fn drop_user(&mut self, username: &str) -> Result<()> {
        let statement = Statement::new(format!("DROP USER {} CASCADE", sql::identifier(username)?));
        self.run(&statement)?;
        tracing::info!(%username, "dropped user");
        Ok(())
    }

    /// True when the user exists.
    pub fn user_exists(&mut self, username: &str) -> Result<bool> {
        let bind = sql::bind(username);
        count_positive(self.session_mut(), USER_EXISTS_QUERY, &[bind.as_str()])
    }

    /// Read a user's attributes back from the catalog.
    pub fn read_user(&mut self, username: &str) -> Result<UserInfo> {
        let bind = sql::bind(username);
        let rows = self.session_mut().query(READ_USER_QUERY, &[bind.as_str()])?;
        let Some(row) = rows.first() else {
            return Err(Error::NotFound {
                kind: "user",
                name: username.to_string(),
            });
        };
        let owned = |idx: usize| -> Result<Option<String>> {
            Ok(row.nullable_text(idx)?.map(str::to_string))
        };
        Ok(UserInfo {
            username: row.text(0)?.to_string(),
            default_tablespace: owned(1)?,
            temporary_tablespace: owned(2)?,
            profile: owned(3)?,
            authentication_type: owned(4)?,
            account_status: owned(5)?,
        })
    }

    /// Create a role.
    pub fn create_role(&mut self, name: &str) -> Result<()> {
        self.run(&create_role_statement(name)?)?;
        tracing::info!(role = %name, "created role");
        Ok(())
    }

    /// Drop a role; the database removes its grants along with it.
    pub fn drop_role(&mut self, name: &str) -> Result<()> {
        self.run(&Statement::new(format!("DROP ROLE {}", sql::identifier(name)?)))?;
        tracing::info!(role = %name, "dropped role");
        Ok(())
    }

    /// True when the role exists.
    pub fn role_exists(&mut self, name: &str) -> Result<bool> {
        let bind = sql::bind(name);
        count_positive(self.session_mut(), ROLE_EXISTS_QUERY, &[bind.as_str()])
    }

    /// Read a role back from the catalog.
    pub fn read_role(&mut self, name: &str) -> Result<RoleInfo> {
        let bind = sql::bind(name);
        let rows = self.session_mut().query(READ_ROLE_QUERY, &[bind.as_str()])?;
        match rows.first() {
            Some(row) => Ok(RoleInfo {
                name: row.text(0)?.to_string(),
            }),
            None => Err(Error::NotFound {
                kind: "role",
                name: name.to_string(),
            }),
        }
    }

    /// True when `name` exists as a user or a role.
    pub fn principal_exists(&mut self, name: &str) -> Result<bool> {
        Ok(self.user_exists(name)? || self.role_exists(name)?)
    }
}
