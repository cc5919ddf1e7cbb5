//! Privilege grants across the four domains and their reconciliation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sql::names::{normalize_identifier, render_privilege, split_qualified_name};
use crate::sql::identifier;

/// Plan and apply grant/revoke deltas.
pub mod engine;
/// Privilege names and option modifiers.
pub mod privilege;

pub use engine::{Applied, ApplyError, Operation, Plan};
pub use privilege::{GrantOption, Privilege};

/// The four privilege domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeKind {
    /// System-wide privileges such as `CREATE SESSION`.
    System,
    /// Privileges on a table, view or other schema object.
    Object,
    /// Privileges on a directory object.
    Directory,
    /// Role membership.
    Role,
}

impl PrivilegeKind {
    /// Option modifier this domain uses.
    pub fn option(self) -> GrantOption {
        match self {
            PrivilegeKind::System | PrivilegeKind::Role => GrantOption::Admin,
            PrivilegeKind::Object | PrivilegeKind::Directory => GrantOption::Grant,
        }
    }

    /// True when grants go out as one comma-joined statement instead of one per privilege.
    pub fn batches_grants(self) -> bool {
        matches!(self, PrivilegeKind::System | PrivilegeKind::Role)
    }

    /// Render a privilege base name for a statement in this domain.
    pub(crate) fn render_name(self, name: &str) -> Result<String> {
        match self {
            PrivilegeKind::Role => identifier(name),
            _ => render_privilege(name).map_err(|reason| Error::InvalidPrivilege {
                privilege: name.to_string(),
                domain: self,
                reason,
            }),
        }
    }
}

impl fmt::Display for PrivilegeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivilegeKind::System => write!(f, "system"),
            PrivilegeKind::Object => write!(f, "object"),
            PrivilegeKind::Directory => write!(f, "directory"),
            PrivilegeKind::Role => write!(f, "role"),
        }
    }
}

/// Reconciliation policy.
///
/// Deserializes from any string; only `enforce` (case-insensitive) selects
/// [`GrantsMode::Enforce`], everything else is [`GrantsMode::Append`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum GrantsMode {
    /// Revoke privileges outside the desired set, then grant the desired set.
    Enforce,
    /// Only grant; never revoke.
    #[default]
    Append,
}

impl GrantsMode {
    /// Lenient parse: unrecognized values mean `append`.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("enforce") {
            GrantsMode::Enforce
        } else {
            GrantsMode::Append
        }
    }
}

impl From<String> for GrantsMode {
    fn from(value: String) -> Self {
        GrantsMode::parse(&value)
    }
}

impl fmt::Display for GrantsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantsMode::Enforce => write!(f, "enforce"),
            GrantsMode::Append => write!(f, "append"),
        }
    }
}

/// What a grant is scoped to; selects the domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// System privileges.
    System,
    /// Object privileges on `owner.object`, or on `object` resolved without an owner.
    Object {
        /// Schema owning the object.
        owner: Option<String>,
        /// Object name; may itself be written `owner.object` when `owner` is `None`.
        object: String,
    },
    /// Directory privileges.
    Directory {
        /// Directory name.
        directory: String,
    },
    /// Role membership.
    Role,
}

impl Target {
    /// Domain of this target.
    pub fn kind(&self) -> PrivilegeKind {
        match self {
            Target::System => PrivilegeKind::System,
            Target::Object { .. } => PrivilegeKind::Object,
            Target::Directory { .. } => PrivilegeKind::Directory,
            Target::Role => PrivilegeKind::Role,
        }
    }

    /// `(owner, object)` with an owner-qualified object name split apart.
    ///
    /// Both parts come back normalized the way the catalog stores them.
    pub(crate) fn object_parts(
        owner: Option<&str>,
        object: &str,
    ) -> Result<(Option<String>, String)> {
        if let Some(owner) = owner.map(str::trim).filter(|o| !o.is_empty()) {
            return Ok((Some(normalize_identifier(owner)), normalize_identifier(object)));
        }
        let mut parts = split_qualified_name(object);
        match parts.len() {
            1 => Ok((None, normalize_identifier(&parts[0]))),
            2 => {
                let object = normalize_identifier(&parts.remove(1));
                Ok((Some(normalize_identifier(&parts[0])), object))
            }
            _ => Err(Error::InvalidIdentifier {
                name: object.to_string(),
                reason: "object name has more than two parts",
            }),
        }
    }

    /// The ` ON ...` clause, empty for system and role grants.
    pub(crate) fn on_clause(&self) -> Result<String> {
        match self {
            Target::System | Target::Role => Ok(String::new()),
            Target::Object { owner, object } => {
                let (owner, object) = Self::object_parts(owner.as_deref(), object)?;
                let object = identifier(&object)?;
                Ok(match owner {
                    Some(owner) => format!(" ON {}.{object}", identifier(&owner)?),
                    None => format!(" ON {object}"),
                })
            }
            Target::Directory { directory } => {
                Ok(format!(" ON DIRECTORY {}", identifier(directory)?))
            }
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::System => write!(f, "system"),
            Target::Role => write!(f, "roles"),
            Target::Object {
                owner: Some(owner),
                object,
            } => write!(f, "object {owner}.{object}"),
            Target::Object { owner: None, object } => write!(f, "object {object}"),
            Target::Directory { directory } => write!(f, "directory {directory}"),
        }
    }
}

/// A desired privilege set for one principal and target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeGrant {
    /// User or role receiving the privileges.
    pub principal: String,
    /// Scope of the grant.
    pub target: Target,
    /// Desired privilege strings, possibly carrying an option clause.
    pub privileges: Vec<String>,
    /// Reconciliation policy.
    pub mode: GrantsMode,
}

impl PrivilegeGrant {
    /// System privileges for `principal`.
    pub fn system<P: AsRef<str>>(principal: &str, privileges: &[P], mode: GrantsMode) -> Self {
        Self::build(principal, Target::System, privileges, mode)
    }

    /// Object privileges on `owner.object` (or `object` alone) for `principal`.
    pub fn object<P: AsRef<str>>(
        principal: &str,
        owner: Option<&str>,
        object: &str,
        privileges: &[P],
        mode: GrantsMode,
    ) -> Self {
        let target = Target::Object {
            owner: owner.map(str::to_string),
            object: object.to_string(),
        };
        Self::build(principal, target, privileges, mode)
    }

    /// Directory privileges on `directory` for `principal`.
    pub fn directory<P: AsRef<str>>(
        principal: &str,
        directory: &str,
        privileges: &[P],
        mode: GrantsMode,
    ) -> Self {
        let target = Target::Directory {
            directory: directory.to_string(),
        };
        Self::build(principal, target, privileges, mode)
    }

    /// Role memberships for `principal`.
    pub fn roles<P: AsRef<str>>(principal: &str, roles: &[P], mode: GrantsMode) -> Self {
        Self::build(principal, Target::Role, roles, mode)
    }

    fn build<P: AsRef<str>>(
        principal: &str,
        target: Target,
        privileges: &[P],
        mode: GrantsMode,
    ) -> Self {
        Self {
            principal: principal.to_string(),
            target,
            privileges: privileges.iter().map(|p| p.as_ref().to_string()).collect(),
            mode,
        }
    }

    /// Domain of this grant.
    pub fn kind(&self) -> PrivilegeKind {
        self.target.kind()
    }

    /// Desired privileges parsed for this grant's domain, in input order.
    pub fn desired(&self) -> Result<Vec<Privilege>> {
        let kind = self.kind();
        self.privileges
            .iter()
            .map(|raw| Privilege::parse(raw, kind))
            .collect()
    }
}

impl fmt::Display for PrivilegeGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} grant to {} ({})", self.target, self.principal, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_mode_defaults_to_append_for_unknown_values() {
        assert_eq!(GrantsMode::parse("enforce"), GrantsMode::Enforce);
        assert_eq!(GrantsMode::parse(" ENFORCE "), GrantsMode::Enforce);
        assert_eq!(GrantsMode::parse("append"), GrantsMode::Append);
        assert_eq!(GrantsMode::parse(""), GrantsMode::Append);
        assert_eq!(GrantsMode::parse("strict"), GrantsMode::Append);
        assert_eq!(GrantsMode::default(), GrantsMode::Append);

        let mode: GrantsMode = serde_json::from_str("\"whatever\"").unwrap();
        assert_eq!(mode, GrantsMode::Append);
        assert_eq!(serde_json::to_string(&GrantsMode::Enforce).unwrap(), "\"enforce\"");
    }

    #[test]
    fn on_clause_matches_each_domain_grammar() {
        assert_eq!(Target::System.on_clause().unwrap(), "");
        assert_eq!(Target::Role.on_clause().unwrap(), "");
        assert_eq!(
            Target::Object {
                owner: Some("hr".into()),
                object: "employees".into()
            }
            .on_clause()
            .unwrap(),
            " ON HR.EMPLOYEES"
        );
        assert_eq!(
            Target::Object {
                owner: None,
                object: "system.test_table".into()
            }
            .on_clause()
            .unwrap(),
            " ON SYSTEM.TEST_TABLE"
        );
        assert_eq!(
            Target::Directory {
                directory: "test_dir".into()
            }
            .on_clause()
            .unwrap(),
            " ON DIRECTORY TEST_DIR"
        );
    }

    #[test]
    fn quoted_owner_parts_keep_their_dots() {
        let dotted = Target::Object {
            owner: None,
            object: r#""my.schema"."t""#.into(),
        };
        assert_eq!(dotted.on_clause().unwrap(), r#" ON "MY.SCHEMA".T"#);

        let padded = Target::Object {
            owner: Some(r#" "hr" "#.into()),
            object: r#""employees""#.into(),
        };
        assert_eq!(padded.on_clause().unwrap(), " ON HR.EMPLOYEES");

        let err = Target::Object {
            owner: None,
            object: "a.b.c".into(),
        }
        .on_clause()
        .expect_err("three-part names are not objects");
        assert!(matches!(err, Error::InvalidIdentifier { .. }));
    }

    #[test]
    fn domains_pick_their_option_and_batching() {
        assert_eq!(PrivilegeKind::System.option(), GrantOption::Admin);
        assert_eq!(PrivilegeKind::Role.option(), GrantOption::Admin);
        assert_eq!(PrivilegeKind::Object.option(), GrantOption::Grant);
        assert_eq!(PrivilegeKind::Directory.option(), GrantOption::Grant);
        assert!(PrivilegeKind::System.batches_grants());
        assert!(!PrivilegeKind::Directory.batches_grants());
    }
}
