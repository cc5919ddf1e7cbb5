//! Declared desired state: users, roles, directories and grants across all four domains.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::grants::{GrantsMode, PrivilegeGrant};
use crate::principal::{create_user_statement, AccountState, Authentication, User};
use crate::sql;

/// How a declared user authenticates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAuthentication {
    /// `IDENTIFIED BY`; the entry must carry a password.
    #[default]
    Password,
    /// `IDENTIFIED EXTERNALLY`
    External,
    /// `IDENTIFIED GLOBALLY`
    Global,
}

/// A user that must exist with the given attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserEntry {
    /// User name.
    pub username: String,
    /// Authentication used when the user is created.
    #[serde(default)]
    pub authentication: UserAuthentication,
    /// Initial password. Only sent on create; existing passwords are left alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Default tablespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tablespace: Option<String>,
    /// Temporary tablespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporary_tablespace: Option<String>,
    /// Profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Lock state; unset leaves it to the database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<AccountState>,
}

impl UserEntry {
    /// The user this entry creates.
    pub fn to_user(&self) -> Result<User> {
        let authentication = match self.authentication {
            UserAuthentication::Password => match self.password.as_deref() {
                Some(password) => Authentication::Password(password.to_string()),
                None => {
                    return Err(Error::Manifest(format!(
                        "user {}: password authentication needs a password",
                        self.username
                    )))
                }
            },
            UserAuthentication::External => Authentication::External,
            UserAuthentication::Global => Authentication::Global,
        };
        Ok(User {
            username: self.username.clone(),
            authentication,
            default_tablespace: self.default_tablespace.clone(),
            temporary_tablespace: self.temporary_tablespace.clone(),
            profile: self.profile.clone(),
            state: self.state,
        })
    }
}

/// System privileges for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemPrivileges {
    /// Receiving user or role.
    pub principal: String,
    /// Desired privileges, optionally carrying `WITH ADMIN OPTION`.
    #[serde(default)]
    pub privileges: Vec<String>,
    /// Reconciliation policy.
    #[serde(default)]
    pub grants_mode: GrantsMode,
}

/// Object privileges for one principal on one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectPrivileges {
    /// Receiving user or role.
    pub principal: String,
    /// Owning schema; may instead be part of `object` as `owner.object`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Object name.
    pub object: String,
    /// Desired privileges, optionally carrying `WITH GRANT OPTION`.
    #[serde(default)]
    pub privileges: Vec<String>,
    /// Reconciliation policy.
    #[serde(default)]
    pub grants_mode: GrantsMode,
}

/// Directory privileges for one principal on one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryPrivileges {
    /// Receiving user or role.
    pub principal: String,
    /// Directory name.
    pub directory: String,
    /// Desired privileges, optionally carrying `WITH GRANT OPTION`.
    #[serde(default)]
    pub privileges: Vec<String>,
    /// Reconciliation policy.
    #[serde(default)]
    pub grants_mode: GrantsMode,
}

/// Role memberships for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleGrants {
    /// Receiving user or role.
    pub principal: String,
    /// Desired roles, optionally carrying `WITH ADMIN OPTION`.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Reconciliation policy.
    #[serde(default)]
    pub grants_mode: GrantsMode,
}

/// A desired-state document. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Users that must exist.
    #[serde(default)]
    pub users: Vec<UserEntry>,
    /// Roles that must exist.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Directories that must exist with the given path.
    #[serde(default)]
    pub directories: Vec<Directory>,
    /// System privilege grants.
    #[serde(default)]
    pub system_privileges: Vec<SystemPrivileges>,
    /// Object privilege grants.
    #[serde(default)]
    pub object_privileges: Vec<ObjectPrivileges>,
    /// Directory privilege grants.
    #[serde(default)]
    pub directory_privileges: Vec<DirectoryPrivileges>,
    /// Role membership grants.
    #[serde(default)]
    pub role_grants: Vec<RoleGrants>,
}

impl Manifest {
    /// Read and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&raw)
            .map_err(|e| Error::Manifest(format!("{}: {e}", path.display())))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Every grant, in the order they are reconciled: system, object,
    /// directory, then role grants, each in document order.
    pub fn grants(&self) -> Vec<PrivilegeGrant> {
        let system = self
            .system_privileges
            .iter()
            .map(|e| PrivilegeGrant::system(&e.principal, &e.privileges, e.grants_mode));
        let object = self.object_privileges.iter().map(|e| {
            PrivilegeGrant::object(
                &e.principal,
                e.owner.as_deref(),
                &e.object,
                &e.privileges,
                e.grants_mode,
            )
        });
        let directory = self.directory_privileges.iter().map(|e| {
            PrivilegeGrant::directory(&e.principal, &e.directory, &e.privileges, e.grants_mode)
        });
        let role = self
            .role_grants
            .iter()
            .map(|e| PrivilegeGrant::roles(&e.principal, &e.roles, e.grants_mode));

        system.chain(object).chain(directory).chain(role).collect()
    }

    /// Check every name and privilege renders, so a bad entry fails before
    /// anything is executed.
    pub fn validate(&self) -> Result<()> {
        for user in &self.users {
            create_user_statement(&user.to_user()?)?;
        }
        for role in &self.roles {
            sql::identifier(role)?;
        }
        for directory in &self.directories {
            sql::identifier(&directory.name)?;
            sql::string_literal(&directory.path)?;
        }
        for grant in self.grants() {
            sql::identifier(&grant.principal)?;
            grant.target.on_clause()?;
            for privilege in grant.desired()? {
                grant.kind().render_name(privilege.name())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grants::{PrivilegeKind, Target};

    #[test]
    fn sections_default_and_grants_follow_domain_order() {
        let manifest: Manifest = serde_json::from_str(
            r#"{
                "role_grants": [{ "principal": "app", "roles": ["reporting"] }],
                "system_privileges": [
                    { "principal": "app", "privileges": ["CREATE SESSION"], "grants_mode": "enforce" }
                ],
                "object_privileges": [
                    { "principal": "app", "object": "hr.employees", "privileges": ["SELECT"], "grants_mode": "bogus" }
                ]
            }"#,
        )
        .unwrap();

        let kinds: Vec<PrivilegeKind> = manifest.grants().iter().map(PrivilegeGrant::kind).collect();
        assert_eq!(
            kinds,
            vec![PrivilegeKind::System, PrivilegeKind::Object, PrivilegeKind::Role]
        );

        let grants = manifest.grants();
        assert_eq!(grants[0].mode, GrantsMode::Enforce);
        assert_eq!(grants[1].mode, GrantsMode::Append);
        assert_eq!(
            grants[1].target,
            Target::Object {
                owner: None,
                object: "hr.employees".into()
            }
        );
        assert_eq!(grants[2].mode, GrantsMode::Append);
        assert!(manifest.roles.is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<Manifest>(r#"{ "groups": [] }"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn validate_rejects_mismatched_option_clauses() {
        let manifest: Manifest = serde_json::from_str(
            r#"{ "directory_privileges": [
                { "principal": "app", "directory": "d", "privileges": ["READ WITH ADMIN OPTION"] }
            ] }"#,
        )
        .unwrap();

        assert!(matches!(
            manifest.validate(),
            Err(Error::InvalidPrivilege { .. })
        ));
    }

    #[test]
    fn password_users_need_a_password() {
        let manifest: Manifest = serde_json::from_str(
            r#"{ "users": [
                { "username": "ops", "authentication": "external" },
                { "username": "app" }
            ] }"#,
        )
        .unwrap();

        assert_eq!(
            manifest.users[0].to_user().unwrap().authentication,
            Authentication::External
        );
        let err = manifest.validate().expect_err("app has no password");
        assert!(matches!(err, Error::Manifest(ref message) if message.contains("user app")));
    }
}
