//! In-memory privilege authority.
//!
//! [`MemoryAuthority`] implements [`Session`] over an in-process catalog. It
//! executes the statement dialect this crate emits and answers the catalog,
//! principal and directory queries, with the error codes a real authority
//! would return for missing grantees, roles and privileges. It backs the
//! `plan` command and the test suite.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::directory::{Directory, DIRECTORY_EXISTS_QUERY, READ_DIRECTORY_QUERY};
use crate::error::Result;
use crate::principal::{
    UserInfo, READ_ROLE_QUERY, READ_USER_QUERY, ROLE_EXISTS_QUERY, USER_EXISTS_QUERY,
};
use crate::session::{Row, Session, SessionError};
use crate::sql::names::{normalize_identifier, normalize_privilege};

/// Statement grammar understood by the authority.
pub(crate) mod interpreter;

use interpreter::{Command, Identification, OnClause, OptionClause, UserAttributes};

/// Schema an unqualified object name resolves to.
pub const CURRENT_SCHEMA: &str = "SYSTEM";

const SYSTEM_PRIVILEGES: &[&str] = &[
    "ALTER ANY PROCEDURE",
    "ALTER ANY ROLE",
    "ALTER ANY TABLE",
    "ALTER SESSION",
    "ALTER SYSTEM",
    "ALTER USER",
    "AUDIT SYSTEM",
    "CREATE ANY DIRECTORY",
    "CREATE ANY INDEX",
    "CREATE ANY PROCEDURE",
    "CREATE ANY SEQUENCE",
    "CREATE ANY TABLE",
    "CREATE ANY VIEW",
    "CREATE DATABASE LINK",
    "CREATE JOB",
    "CREATE MATERIALIZED VIEW",
    "CREATE PROCEDURE",
    "CREATE PUBLIC SYNONYM",
    "CREATE ROLE",
    "CREATE SEQUENCE",
    "CREATE SESSION",
    "CREATE SYNONYM",
    "CREATE TABLE",
    "CREATE TABLESPACE",
    "CREATE TRIGGER",
    "CREATE TYPE",
    "CREATE USER",
    "CREATE VIEW",
    "DEBUG CONNECT SESSION",
    "DELETE ANY TABLE",
    "DROP ANY DIRECTORY",
    "DROP ANY ROLE",
    "DROP ANY TABLE",
    "DROP USER",
    "EXECUTE ANY PROCEDURE",
    "GRANT ANY OBJECT PRIVILEGE",
    "GRANT ANY PRIVILEGE",
    "GRANT ANY ROLE",
    "INSERT ANY TABLE",
    "RESTRICTED SESSION",
    "SELECT ANY DICTIONARY",
    "SELECT ANY TABLE",
    "UNLIMITED TABLESPACE",
    "UPDATE ANY TABLE",
];

const OBJECT_PRIVILEGES: &[&str] = &[
    "ALTER",
    "DEBUG",
    "DELETE",
    "EXECUTE",
    "FLASHBACK",
    "INDEX",
    "INSERT",
    "READ",
    "REFERENCES",
    "SELECT",
    "UPDATE",
];

const DIRECTORY_PRIVILEGES: &[&str] = &["EXECUTE", "READ", "WRITE"];

pub(crate) fn ora(code: &str, message: impl std::fmt::Display) -> SessionError {
    SessionError::Database(format!("ORA-{code}: {message}"))
}

/// A grant as it appears in a [`CatalogSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum HeldGrant {
    /// A system privilege.
    System {
        /// Receiving user or role.
        grantee: String,
        /// Privilege name.
        privilege: String,
        /// Held `WITH ADMIN OPTION`.
        #[serde(default)]
        admin_option: bool,
    },
    /// A privilege on a schema object.
    Object {
        /// Receiving user or role.
        grantee: String,
        /// Owning schema.
        owner: String,
        /// Object name.
        object: String,
        /// Privilege name.
        privilege: String,
        /// Held `WITH GRANT OPTION`.
        #[serde(default)]
        grantable: bool,
    },
    /// A privilege on a directory.
    Directory {
        /// Receiving user or role.
        grantee: String,
        /// Directory name.
        directory: String,
        /// Privilege name.
        privilege: String,
        /// Held `WITH GRANT OPTION`.
        #[serde(default)]
        grantable: bool,
    },
    /// A role membership.
    Role {
        /// Receiving user or role.
        grantee: String,
        /// Granted role.
        role: String,
        /// Held `WITH ADMIN OPTION`.
        #[serde(default)]
        admin_option: bool,
    },
}

/// An object in a [`CatalogSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Owning schema.
    pub owner: String,
    /// Object name.
    pub name: String,
}

/// Serializable catalog contents. Every section is optional when loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Users; unset attributes take the authority defaults.
    #[serde(default)]
    pub users: Vec<UserInfo>,
    /// Role names.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Directory objects.
    #[serde(default)]
    pub directories: Vec<Directory>,
    /// Schema objects grants can target.
    #[serde(default)]
    pub objects: Vec<ObjectRef>,
    /// Held grants, in catalog order.
    #[serde(default)]
    pub grants: Vec<HeldGrant>,
}

impl CatalogSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UserRecord {
    authentication_type: String,
    default_tablespace: String,
    temporary_tablespace: String,
    profile: String,
    locked: bool,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            authentication_type: "PASSWORD".to_string(),
            default_tablespace: "USERS".to_string(),
            temporary_tablespace: "TEMP".to_string(),
            profile: "DEFAULT".to_string(),
            locked: false,
        }
    }
}

impl UserRecord {
    fn update(&mut self, attributes: UserAttributes) {
        if let Some(identification) = attributes.identification {
            self.authentication_type = match identification {
                Identification::Password(_) => "PASSWORD",
                Identification::Externally => "EXTERNAL",
                Identification::Globally => "GLOBAL",
            }
            .to_string();
        }
        if let Some(tablespace) = attributes.default_tablespace {
            self.default_tablespace = tablespace;
        }
        if let Some(tablespace) = attributes.temporary_tablespace {
            self.temporary_tablespace = tablespace;
        }
        if let Some(profile) = attributes.profile {
            self.profile = profile;
        }
        if let Some(locked) = attributes.locked {
            self.locked = locked;
        }
    }

    fn account_status(&self) -> &'static str {
        if self.locked {
            "LOCKED"
        } else {
            "OPEN"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Scope {
    System,
    Role,
    Object { owner: String, name: String },
    Directory(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Grant {
    grantee: String,
    scope: Scope,
    privilege: String,
    option: bool,
}

/// Injected failure: statements containing `pattern` fail with `message`.
#[derive(Debug, Clone)]
struct FailureRule {
    pattern: String,
    message: String,
}

/// A [`Session`] backed by an in-memory catalog. Names are stored upper-cased.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthority {
    users: BTreeMap<String, UserRecord>,
    roles: BTreeSet<String>,
    directories: BTreeMap<String, String>,
    objects: BTreeSet<(String, String)>,
    grants: Vec<Grant>,
    executed: Vec<String>,
    queries: Vec<String>,
    failures: Vec<FailureRule>,
    query_failures: Vec<FailureRule>,
}

impl MemoryAuthority {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog seeded from `snapshot`.
    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Self {
        let mut authority = Self::new();
        for user in &snapshot.users {
            let record = UserRecord::default();
            let record = UserRecord {
                authentication_type: user
                    .authentication_type
                    .clone()
                    .unwrap_or(record.authentication_type),
                default_tablespace: user
                    .default_tablespace
                    .clone()
                    .unwrap_or(record.default_tablespace),
                temporary_tablespace: user
                    .temporary_tablespace
                    .clone()
                    .unwrap_or(record.temporary_tablespace),
                profile: user.profile.clone().unwrap_or(record.profile),
                locked: user
                    .account_status
                    .as_deref()
                    .is_some_and(|status| status.to_ascii_uppercase().contains("LOCKED")),
            };
            authority
                .users
                .insert(normalize_identifier(&user.username), record);
        }
        authority
            .roles
            .extend(snapshot.roles.iter().map(|r| normalize_identifier(r)));
        for directory in &snapshot.directories {
            authority
                .directories
                .insert(normalize_identifier(&directory.name), directory.path.clone());
        }
        for object in &snapshot.objects {
            authority.objects.insert((
                normalize_identifier(&object.owner),
                normalize_identifier(&object.name),
            ));
        }
        for held in &snapshot.grants {
            let grant = match held {
                HeldGrant::System {
                    grantee,
                    privilege,
                    admin_option,
                } => Grant {
                    grantee: normalize_identifier(grantee),
                    scope: Scope::System,
                    privilege: normalize_privilege(privilege),
                    option: *admin_option,
                },
                HeldGrant::Object {
                    grantee,
                    owner,
                    object,
                    privilege,
                    grantable,
                } => {
                    let (owner, name) = (normalize_identifier(owner), normalize_identifier(object));
                    authority.objects.insert((owner.clone(), name.clone()));
                    Grant {
                        grantee: normalize_identifier(grantee),
                        scope: Scope::Object { owner, name },
                        privilege: normalize_privilege(privilege),
                        option: *grantable,
                    }
                }
                HeldGrant::Directory {
                    grantee,
                    directory,
                    privilege,
                    grantable,
                } => Grant {
                    grantee: normalize_identifier(grantee),
                    scope: Scope::Directory(normalize_identifier(directory)),
                    privilege: normalize_privilege(privilege),
                    option: *grantable,
                },
                HeldGrant::Role {
                    grantee,
                    role,
                    admin_option,
                } => Grant {
                    grantee: normalize_identifier(grantee),
                    scope: Scope::Role,
                    privilege: normalize_identifier(role),
                    option: *admin_option,
                },
            };
            authority.grants.push(grant);
        }
        authority
    }

    /// Export the current catalog.
    pub fn snapshot(&self) -> CatalogSnapshot {
        let users = self
            .users
            .iter()
            .map(|(name, record)| UserInfo {
                username: name.clone(),
                default_tablespace: Some(record.default_tablespace.clone()),
                temporary_tablespace: Some(record.temporary_tablespace.clone()),
                profile: Some(record.profile.clone()),
                authentication_type: Some(record.authentication_type.clone()),
                account_status: Some(record.account_status().to_string()),
            })
            .collect();
        let grants = self
            .grants
            .iter()
            .map(|grant| {
                let grantee = grant.grantee.clone();
                let privilege = grant.privilege.clone();
                match &grant.scope {
                    Scope::System => HeldGrant::System {
                        grantee,
                        privilege,
                        admin_option: grant.option,
                    },
                    Scope::Role => HeldGrant::Role {
                        grantee,
                        role: privilege,
                        admin_option: grant.option,
                    },
                    Scope::Object { owner, name } => HeldGrant::Object {
                        grantee,
                        owner: owner.clone(),
                        object: name.clone(),
                        privilege,
                        grantable: grant.option,
                    },
                    Scope::Directory(directory) => HeldGrant::Directory {
                        grantee,
                        directory: directory.clone(),
                        privilege,
                        grantable: grant.option,
                    },
                }
            })
            .collect();

        CatalogSnapshot {
            users,
            roles: self.roles.iter().cloned().collect(),
            directories: self
                .directories
                .iter()
                .map(|(name, path)| Directory::new(name, path))
                .collect(),
            objects: self
                .objects
                .iter()
                .map(|(owner, name)| ObjectRef {
                    owner: owner.clone(),
                    name: name.clone(),
                })
                .collect(),
            grants,
        }
    }

    /// Make every statement containing `pattern` (case-insensitive) fail with `message`.
    pub fn fail_when(&mut self, pattern: &str, message: &str) {
        self.failures.push(FailureRule {
            pattern: pattern.to_uppercase(),
            message: message.to_string(),
        });
    }

    /// Make every query containing `pattern` (case-insensitive) fail with `message`.
    pub fn fail_query_when(&mut self, pattern: &str, message: &str) {
        self.query_failures.push(FailureRule {
            pattern: pattern.to_uppercase(),
            message: message.to_string(),
        });
    }

    /// Statements executed successfully, in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Queries received, in order.
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    fn principal_exists(&self, name: &str) -> bool {
        self.users.contains_key(name) || self.roles.contains(name)
    }

    fn require_grantee(&self, grantee: &str) -> std::result::Result<(), SessionError> {
        if self.principal_exists(grantee) {
            Ok(())
        } else {
            Err(ora("01917", format!("user or role '{grantee}' does not exist")))
        }
    }

    fn resolve_scope(&self, on: Option<OnClause>) -> std::result::Result<Option<Scope>, SessionError> {
        match on {
            None => Ok(None),
            Some(OnClause::Directory(name)) => {
                if !self.directories.contains_key(&name) {
                    return Err(ora("00942", "table or view does not exist"));
                }
                Ok(Some(Scope::Directory(name)))
            }
            Some(OnClause::Object { owner, name }) => {
                let owner = owner.unwrap_or_else(|| CURRENT_SCHEMA.to_string());
                if !self.objects.contains(&(owner.clone(), name.clone())) {
                    return Err(ora("00942", "table or view does not exist"));
                }
                Ok(Some(Scope::Object { owner, name }))
            }
        }
    }

    /// Scope of each entry of a grant or revoke list. Without an `ON` clause a
    /// known role name is a role grant and anything else must be a system privilege.
    fn classify(
        &self,
        privileges: &[String],
        on: &Option<Scope>,
    ) -> std::result::Result<Vec<Scope>, SessionError> {
        privileges
            .iter()
            .map(|privilege| match on {
                Some(scope @ Scope::Directory(_)) => {
                    if DIRECTORY_PRIVILEGES.contains(&privilege.as_str()) {
                        Ok(scope.clone())
                    } else {
                        Err(ora("22928", "invalid privilege on directories"))
                    }
                }
                Some(scope) => {
                    if OBJECT_PRIVILEGES.contains(&privilege.as_str()) {
                        Ok(scope.clone())
                    } else {
                        Err(ora("00990", "missing or invalid privilege"))
                    }
                }
                None if self.roles.contains(privilege) => Ok(Scope::Role),
                None if SYSTEM_PRIVILEGES.contains(&privilege.as_str()) => Ok(Scope::System),
                None => Err(ora("01919", format!("role '{privilege}' does not exist"))),
            })
            .collect()
    }

    fn position(&self, grantee: &str, scope: &Scope, privilege: &str) -> Option<usize> {
        self.grants.iter().position(|grant| {
            grant.grantee == grantee && &grant.scope == scope && grant.privilege == privilege
        })
    }

    fn grant(
        &mut self,
        privileges: Vec<String>,
        on: Option<OnClause>,
        grantee: String,
        option: Option<OptionClause>,
    ) -> std::result::Result<(), SessionError> {
        self.require_grantee(&grantee)?;
        let on = self.resolve_scope(on)?;
        match (&on, option) {
            (None, Some(OptionClause::Grant)) => {
                return Err(ora("01939", "only the ADMIN OPTION can be specified"));
            }
            (Some(_), Some(OptionClause::Admin)) => {
                return Err(ora("00993", "missing GRANT keyword"));
            }
            _ => {}
        }
        let scopes = self.classify(&privileges, &on)?;
        for (privilege, scope) in privileges.into_iter().zip(scopes) {
            if scope == Scope::Role && privilege == grantee {
                return Err(ora("01934", "circular role grant detected"));
            }
            match self.position(&grantee, &scope, &privilege) {
                Some(idx) => self.grants[idx].option |= option.is_some(),
                None => self.grants.push(Grant {
                    grantee: grantee.clone(),
                    scope,
                    privilege,
                    option: option.is_some(),
                }),
            }
        }
        Ok(())
    }

    fn revoke(
        &mut self,
        privileges: Vec<String>,
        on: Option<OnClause>,
        grantee: String,
    ) -> std::result::Result<(), SessionError> {
        self.require_grantee(&grantee)?;
        let on = self.resolve_scope(on)?;
        let scopes = self.classify(&privileges, &on)?;

        let mut doomed = Vec::with_capacity(privileges.len());
        for (privilege, scope) in privileges.iter().zip(scopes) {
            match self.position(&grantee, &scope, privilege) {
                Some(idx) => doomed.push(idx),
                None => {
                    return Err(match scope {
                        Scope::System => ora(
                            "01952",
                            format!("system privileges not granted to '{grantee}'"),
                        ),
                        Scope::Role => ora(
                            "01951",
                            format!("ROLE '{privilege}' not granted to '{grantee}'"),
                        ),
                        _ => ora("01927", "cannot REVOKE privileges you did not grant"),
                    });
                }
            }
        }

        let mut idx = 0;
        self.grants.retain(|_| {
            let keep = !doomed.contains(&idx);
            idx += 1;
            keep
        });
        Ok(())
    }

    fn apply(&mut self, command: Command) -> std::result::Result<(), SessionError> {
        match command {
            Command::CreateUser { name, attributes } => {
                if self.principal_exists(&name) {
                    return Err(ora(
                        "01920",
                        format!("user name '{name}' conflicts with another user or role name"),
                    ));
                }
                let mut record = UserRecord::default();
                record.update(attributes);
                self.users.insert(name, record);
            }
            Command::AlterUser { name, attributes } => {
                let Some(record) = self.users.get_mut(&name) else {
                    return Err(ora("01918", format!("user '{name}' does not exist")));
                };
                record.update(attributes);
            }
            Command::DropUser { name, cascade } => {
                if !self.users.contains_key(&name) {
                    return Err(ora("01918", format!("user '{name}' does not exist")));
                }
                let owns_objects = self.objects.iter().any(|(owner, _)| owner == &name);
                if owns_objects && !cascade {
                    return Err(ora("01922", format!("CASCADE must be specified to drop '{name}'")));
                }
                self.users.remove(&name);
                self.objects.retain(|(owner, _)| owner != &name);
                self.grants.retain(|grant| {
                    grant.grantee != name
                        && !matches!(&grant.scope, Scope::Object { owner, .. } if owner == &name)
                });
            }
            Command::CreateRole { name } => {
                if self.principal_exists(&name) {
                    return Err(ora(
                        "01921",
                        format!("role name '{name}' conflicts with another user or role name"),
                    ));
                }
                self.roles.insert(name);
            }
            Command::DropRole { name } => {
                if !self.roles.remove(&name) {
                    return Err(ora("01919", format!("role '{name}' does not exist")));
                }
                self.grants.retain(|grant| {
                    grant.grantee != name && !(grant.scope == Scope::Role && grant.privilege == name)
                });
            }
            Command::CreateDirectory {
                name,
                path,
                replace,
            } => {
                if !replace && self.directories.contains_key(&name) {
                    return Err(ora("00955", "name is already used by an existing object"));
                }
                self.directories.insert(name, path);
            }
            Command::DropDirectory { name } => {
                if self.directories.remove(&name).is_none() {
                    return Err(ora("04043", format!("object {name} does not exist")));
                }
                self.grants
                    .retain(|grant| grant.scope != Scope::Directory(name.clone()));
            }
            Command::CreateTable { owner, name } => {
                let owner = owner.unwrap_or_else(|| CURRENT_SCHEMA.to_string());
                if !self.objects.insert((owner, name)) {
                    return Err(ora("00955", "name is already used by an existing object"));
                }
            }
            Command::Grant {
                privileges,
                on,
                grantee,
                option,
            } => self.grant(privileges, on, grantee, option)?,
            Command::Revoke {
                privileges,
                on,
                grantee,
            } => self.revoke(privileges, on, grantee)?,
        }
        Ok(())
    }

    fn held_rows(&self, grantee: &str, matches: impl Fn(&Scope) -> bool) -> Vec<Row> {
        self.grants
            .iter()
            .filter(|grant| grant.grantee == grantee && matches(&grant.scope))
            .map(|grant| {
                let flag = if grant.option { "YES" } else { "NO" };
                Row::from_texts([grant.privilege.as_str(), flag])
            })
            .collect()
    }

    fn count_row(found: bool) -> Vec<Row> {
        vec![Row::from_texts([if found { "1" } else { "0" }])]
    }
}

fn bind(binds: &[&str], idx: usize) -> std::result::Result<String, SessionError> {
    binds
        .get(idx)
        .map(|value| value.to_uppercase())
        .ok_or_else(|| ora("01008", "not all variables bound"))
}

impl Session for MemoryAuthority {
    fn execute(&mut self, sql: &str) -> std::result::Result<(), SessionError> {
        let upper = sql.to_uppercase();
        if let Some(rule) = self.failures.iter().find(|rule| upper.contains(&rule.pattern)) {
            return Err(SessionError::Database(rule.message.clone()));
        }
        let command = interpreter::parse(sql)?;
        self.apply(command)?;
        self.executed.push(sql.to_string());
        Ok(())
    }

    fn query(&mut self, sql: &str, binds: &[&str]) -> std::result::Result<Vec<Row>, SessionError> {
        self.queries.push(sql.to_string());
        let upper = sql.to_uppercase();
        if let Some(rule) = self.query_failures.iter().find(|rule| upper.contains(&rule.pattern)) {
            return Err(SessionError::Database(rule.message.clone()));
        }
        let rows = match sql {
            catalog::SYSTEM_PRIVILEGES_QUERY => {
                self.held_rows(&bind(binds, 0)?, |scope| *scope == Scope::System)
            }
            catalog::ROLE_GRANTS_QUERY => {
                self.held_rows(&bind(binds, 0)?, |scope| *scope == Scope::Role)
            }
            catalog::OBJECT_PRIVILEGES_QUERY => {
                let (owner, table) = (bind(binds, 1)?, bind(binds, 2)?);
                self.held_rows(&bind(binds, 0)?, |scope| {
                    matches!(scope, Scope::Object { owner: o, name } if *o == owner && *name == table)
                })
            }
            catalog::UNQUALIFIED_OBJECT_PRIVILEGES_QUERY => {
                let table = bind(binds, 1)?;
                self.held_rows(&bind(binds, 0)?, |scope| {
                    matches!(scope, Scope::Object { name, .. } if *name == table)
                })
            }
            catalog::DIRECTORY_PRIVILEGES_QUERY => {
                let directory = bind(binds, 1)?;
                self.held_rows(&bind(binds, 0)?, |scope| {
                    matches!(scope, Scope::Directory(name) if *name == directory)
                })
            }
            USER_EXISTS_QUERY => Self::count_row(self.users.contains_key(&bind(binds, 0)?)),
            ROLE_EXISTS_QUERY => Self::count_row(self.roles.contains(&bind(binds, 0)?)),
            DIRECTORY_EXISTS_QUERY => {
                Self::count_row(self.directories.contains_key(&bind(binds, 0)?))
            }
            READ_USER_QUERY => {
                let name = bind(binds, 0)?;
                self.users
                    .get(&name)
                    .map(|record| {
                        Row::from_texts([
                            name.as_str(),
                            record.default_tablespace.as_str(),
                            record.temporary_tablespace.as_str(),
                            record.profile.as_str(),
                            record.authentication_type.as_str(),
                            record.account_status(),
                        ])
                    })
                    .into_iter()
                    .collect()
            }
            READ_ROLE_QUERY => {
                let name = bind(binds, 0)?;
                if self.roles.contains(&name) {
                    vec![Row::from_texts([name])]
                } else {
                    Vec::new()
                }
            }
            READ_DIRECTORY_QUERY => {
                let name = bind(binds, 0)?;
                self.directories
                    .get(&name)
                    .map(|path| Row::from_texts([name.as_str(), path.as_str()]))
                    .into_iter()
                    .collect()
            }
            _ => return Err(ora("00900", "invalid SQL statement")),
        };
        tracing::trace!(query = sql, ?binds, rows = rows.len(), "answered query");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(authority: &mut MemoryAuthority, statements: &[&str]) {
        for sql in statements {
            authority.execute(sql).unwrap_or_else(|e| panic!("{sql}: {e}"));
        }
    }

    #[test]
    fn names_resolve_as_roles_before_system_privileges() {
        let mut authority = MemoryAuthority::new();
        run(
            &mut authority,
            &[
                "CREATE USER APP IDENTIFIED BY \"pw\"",
                "CREATE ROLE REPORTING",
                "GRANT CREATE SESSION, REPORTING TO APP",
            ],
        );

        let system = authority
            .query(catalog::SYSTEM_PRIVILEGES_QUERY, &["app"])
            .unwrap();
        let roles = authority.query(catalog::ROLE_GRANTS_QUERY, &["app"]).unwrap();

        assert_eq!(system, vec![Row::from_texts(["CREATE SESSION", "NO"])]);
        assert_eq!(roles, vec![Row::from_texts(["REPORTING", "NO"])]);
    }

    #[test]
    fn regrant_with_option_upgrades_in_place() {
        let mut authority = MemoryAuthority::new();
        run(
            &mut authority,
            &[
                "CREATE USER APP IDENTIFIED BY \"pw\"",
                "CREATE TABLE HR.EMPLOYEES (ID NUMBER)",
                "GRANT SELECT ON HR.EMPLOYEES TO APP",
                "GRANT SELECT ON HR.EMPLOYEES TO APP WITH GRANT OPTION",
                "GRANT SELECT ON HR.EMPLOYEES TO APP",
            ],
        );

        let rows = authority
            .query(catalog::OBJECT_PRIVILEGES_QUERY, &["app", "hr", "employees"])
            .unwrap();
        assert_eq!(rows, vec![Row::from_texts(["SELECT", "YES"])]);
    }

    #[test]
    fn missing_grantees_roles_and_privileges_report_authority_errors() {
        let mut authority = MemoryAuthority::new();
        let err = authority.execute("GRANT CREATE SESSION TO GHOST").unwrap_err();
        assert!(err.to_string().starts_with("ORA-01917"));

        run(&mut authority, &["CREATE USER APP IDENTIFIED BY \"pw\""]);
        let err = authority.execute("GRANT NO_SUCH_ROLE TO APP").unwrap_err();
        assert!(err.to_string().starts_with("ORA-01919"));

        let err = authority.execute("REVOKE CREATE TABLE FROM APP").unwrap_err();
        assert!(err.to_string().starts_with("ORA-01952"));

        let err = authority.execute("CREATE USER app IDENTIFIED BY \"x\"").unwrap_err();
        assert!(err.to_string().starts_with("ORA-01920"));
        assert_eq!(authority.executed().len(), 1);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut authority = MemoryAuthority::new();
        run(
            &mut authority,
            &[
                "CREATE USER APP IDENTIFIED BY \"pw\" ACCOUNT LOCK",
                "CREATE OR REPLACE DIRECTORY DATA_DIR AS '/data'",
                "GRANT READ ON DIRECTORY DATA_DIR TO APP WITH GRANT OPTION",
            ],
        );

        let json = serde_json::to_string(&authority.snapshot()).unwrap();
        let restored = MemoryAuthority::from_snapshot(&serde_json::from_str(&json).unwrap());

        assert_eq!(restored.snapshot(), authority.snapshot());
        assert_eq!(
            restored.snapshot().users[0].account_status.as_deref(),
            Some("LOCKED")
        );
    }

    #[test]
    fn injected_failures_match_case_insensitively() {
        let mut authority = MemoryAuthority::new();
        authority.fail_when("create role", "ORA-01031: insufficient privileges");

        let err = authority.execute("CREATE ROLE R").unwrap_err();

        assert_eq!(
            err,
            SessionError::Database("ORA-01031: insufficient privileges".into())
        );
        assert!(authority.executed().is_empty());

        authority.fail_query_when("dba_role_privs", "ORA-00942: table or view does not exist");
        let err = authority
            .query(catalog::ROLE_GRANTS_QUERY, &["APP"])
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::Database("ORA-00942: table or view does not exist".into())
        );
        assert!(authority
            .query(catalog::SYSTEM_PRIVILEGES_QUERY, &["APP"])
            .is_ok());
    }
}
