//! Converge a whole [`Manifest`] onto the authority and report the drift found.

use std::collections::HashSet;

use crate::catalog;
use crate::client::Client;
use crate::directory::{create_directory_statement, Directory};
use crate::error::{Error, Result};
use crate::grants::engine::{self, Applied};
use crate::grants::{GrantsMode, Privilege, PrivilegeGrant};
use crate::manifest::Manifest;
use crate::principal::{
    create_role_statement, create_user_statement, modify_user_statement, AccountState, User,
    UserChanges, UserInfo,
};
use crate::session::Session;
use crate::sql::names::normalize_identifier;
use crate::sql::Statement;

/// A directory that was created or repointed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryChange {
    /// Declared directory.
    pub directory: Directory,
    /// Path held before the change; `None` when the directory was missing.
    pub previous_path: Option<String>,
}

/// Drift and applied operations for one grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantOutcome {
    /// The grant as declared.
    pub grant: PrivilegeGrant,
    /// Whether the principal existed when the grant was reconciled.
    pub principal_exists: bool,
    /// Desired privileges that were not held, or held without the desired option.
    pub missing: Vec<Privilege>,
    /// Held privileges the enforce policy revoked.
    pub extra: Vec<Privilege>,
    /// Operations executed for this grant.
    pub applied: Applied,
}

impl GrantOutcome {
    /// True when the held state differed from the declared one.
    pub fn drifted(&self) -> bool {
        !self.missing.is_empty() || !self.extra.is_empty()
    }
}

/// Result of a converge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvergeReport {
    /// Users that had to be created.
    pub created_users: Vec<String>,
    /// Existing users whose attributes had to change.
    pub modified_users: Vec<String>,
    /// Roles that had to be created.
    pub created_roles: Vec<String>,
    /// Directories that had to be created or repointed.
    pub directories: Vec<DirectoryChange>,
    /// One outcome per grant, in reconcile order.
    pub outcomes: Vec<GrantOutcome>,
    /// Every statement executed, in order.
    pub statements: Vec<Statement>,
}

impl ConvergeReport {
    /// True when anything had to change.
    pub fn has_drift(&self) -> bool {
        !self.created_users.is_empty()
            || !self.modified_users.is_empty()
            || !self.created_roles.is_empty()
            || !self.directories.is_empty()
            || self.outcomes.iter().any(GrantOutcome::drifted)
    }

    /// Number of grants that drifted.
    pub fn drifted_grants(&self) -> usize {
        self.outcomes.iter().filter(|o| o.drifted()).count()
    }
}

/// Split `current` against `desired` into (missing, extra).
///
/// Comparison is on the base-name key. A desired entry carrying an option also
/// counts as missing when it is held without one.
pub fn drift(
    grant: &PrivilegeGrant,
    desired: &[Privilege],
    current: &[Privilege],
) -> (Vec<Privilege>, Vec<Privilege>) {
    let missing = desired
        .iter()
        .filter(|want| {
            !current
                .iter()
                .any(|held| held.key() == want.key() && (held.has_option() || !want.has_option()))
        })
        .cloned()
        .collect();

    let extra = match grant.mode {
        GrantsMode::Enforce => {
            let wanted: HashSet<String> = desired.iter().map(Privilege::key).collect();
            current
                .iter()
                .filter(|held| !wanted.contains(&held.key()))
                .cloned()
                .collect()
        }
        GrantsMode::Append => Vec::new(),
    };

    (missing, extra)
}

/// Attributes of `user` that differ from what the catalog holds.
///
/// Names compare in their stored spelling. The password is never compared.
pub fn user_changes(user: &User, held: &UserInfo) -> UserChanges {
    let differs = |want: &Option<String>, have: &Option<String>| -> Option<String> {
        let want = want.as_deref().map(str::trim).filter(|w| !w.is_empty())?;
        let have = have.as_deref().map(normalize_identifier);
        (have.as_deref() != Some(normalize_identifier(want).as_str())).then(|| want.to_string())
    };
    let locked = held
        .account_status
        .as_deref()
        .is_some_and(|status| status.to_ascii_uppercase().contains("LOCKED"));
    let state = match user.state {
        Some(AccountState::Locked) if !locked => Some(AccountState::Locked),
        Some(AccountState::Unlocked) if locked => Some(AccountState::Unlocked),
        _ => None,
    };

    UserChanges {
        username: user.username.clone(),
        password: None,
        default_tablespace: differs(&user.default_tablespace, &held.default_tablespace),
        temporary_tablespace: differs(&user.temporary_tablespace, &held.temporary_tablespace),
        profile: differs(&user.profile, &held.profile),
        state,
    }
}

impl<S: Session> Client<S> {
    /// Converge the authority onto `manifest`.
    ///
    /// Users are created when missing and updated when their attributes
    /// differ. Roles are created when missing, directories are created or repointed,
    /// then each grant is reconciled in [`Manifest::grants`] order. The first
    /// failure aborts the run; statements already executed stay applied.
    pub fn converge(&mut self, manifest: &Manifest) -> Result<ConvergeReport> {
        manifest.validate()?;
        let mut report = ConvergeReport::default();

        for entry in &manifest.users {
            let user = entry.to_user()?;
            match self.read_user(&user.username) {
                Ok(held) => {
                    let Some(statement) = modify_user_statement(&user_changes(&user, &held))? else {
                        tracing::debug!(username = %user.username, "user present");
                        continue;
                    };
                    self.run(&statement)?;
                    tracing::info!(username = %user.username, "updated user");
                    report.modified_users.push(user.username.clone());
                    report.statements.push(statement);
                }
                Err(Error::NotFound { .. }) => {
                    let statement = create_user_statement(&user)?;
                    self.run(&statement)?;
                    tracing::info!(username = %user.username, "created user");
                    report.created_users.push(user.username.clone());
                    report.statements.push(statement);
                }
                Err(err) => return Err(err),
            }
        }

        for role in &manifest.roles {
            if self.role_exists(role)? {
                tracing::debug!(%role, "role present");
                continue;
            }
            let statement = create_role_statement(role)?;
            self.run(&statement)?;
            tracing::info!(%role, "created role");
            report.created_roles.push(role.clone());
            report.statements.push(statement);
        }

        for directory in &manifest.directories {
            let previous_path = match self.read_directory(&directory.name) {
                Ok(held) if held.path == directory.path => {
                    tracing::debug!(directory = %directory.name, "directory present");
                    continue;
                }
                Ok(held) => Some(held.path),
                Err(Error::NotFound { .. }) => None,
                Err(err) => return Err(err),
            };
            let statement = create_directory_statement(directory)?;
            self.run(&statement)?;
            tracing::info!(
                directory = %directory.name,
                path = %directory.path,
                previous = previous_path.as_deref().unwrap_or("-"),
                "converged directory"
            );
            report.statements.push(statement);
            report.directories.push(DirectoryChange {
                directory: directory.clone(),
                previous_path,
            });
        }

        for grant in manifest.grants() {
            let principal_exists = self.principal_exists(&grant.principal)?;
            if !principal_exists {
                tracing::warn!(principal = %grant.principal, %grant, "principal does not exist");
            }

            let desired = grant.desired()?;
            let current =
                catalog::current_privileges(self.session_mut(), &grant.principal, &grant.target)?;
            let (missing, extra) = drift(&grant, &desired, &current);
            if !missing.is_empty() || !extra.is_empty() {
                tracing::info!(
                    %grant,
                    missing = missing.len(),
                    extra = extra.len(),
                    "drift detected"
                );
            }

            let held: &[Privilege] = match grant.mode {
                GrantsMode::Enforce => current.as_slice(),
                GrantsMode::Append => &[],
            };
            let plan = engine::plan(&grant, held)?;
            let applied = engine::apply(self.session_mut(), plan)?;
            report.statements.extend(applied.statements().cloned());
            report.outcomes.push(GrantOutcome {
                grant,
                principal_exists,
                missing,
                extra,
                applied,
            });
        }

        tracing::info!(
            created_users = report.created_users.len(),
            modified_users = report.modified_users.len(),
            created_roles = report.created_roles.len(),
            directories = report.directories.len(),
            drifted_grants = report.drifted_grants(),
            statements = report.statements.len(),
            "converge finished"
        );
        Ok(report)
    }
}
