use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::catalog;
use crate::client::Client;
use crate::error::Result;
use crate::grants::{GrantsMode, Privilege, PrivilegeGrant, PrivilegeKind, Target};
use crate::session::{Session, SessionError};
use crate::sql::{self, Statement};

/// One step of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Remove a held privilege that is not desired.
    Revoke {
        /// Privilege as the catalog reported it, option included.
        privilege: Privilege,
        /// Statement that removes it.
        statement: Statement,
    },
    /// Grant one or more desired privileges sharing an option clause.
    Grant {
        /// Privileges covered by the statement.
        privileges: Vec<Privilege>,
        /// Statement that grants them.
        statement: Statement,
    },
}

impl Operation {
    /// Statement this operation sends.
    pub fn statement(&self) -> &Statement {
        match self {
            Operation::Revoke { statement, .. } | Operation::Grant { statement, .. } => statement,
        }
    }

    /// True for revokes.
    pub fn is_revoke(&self) -> bool {
        matches!(self, Operation::Revoke { .. })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.statement().fmt(f)
    }
}

/// Ordered operations converging one principal/target: revokes first, then grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Domain of the grant.
    pub kind: PrivilegeKind,
    /// Principal the plan applies to.
    pub principal: String,
    /// Operations in execution order.
    pub operations: Vec<Operation>,
}

impl Plan {
    /// Revoke operations.
    pub fn revokes(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| op.is_revoke())
    }

    /// Grant operations.
    pub fn grants(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| !op.is_revoke())
    }

    /// True when nothing would be executed.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Operations that were executed successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    /// Operations in execution order.
    pub operations: Vec<Operation>,
}

impl Applied {
    /// Number of revokes executed.
    pub fn revoked(&self) -> usize {
        self.operations.iter().filter(|op| op.is_revoke()).count()
    }

    /// Number of grant statements executed.
    pub fn granted(&self) -> usize {
        self.operations.len() - self.revoked()
    }

    /// Executed statements.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.operations.iter().map(Operation::statement)
    }
}

/// An operation failed mid-plan. Earlier operations stay applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{failed}` failed after {} applied operation(s): {source}", applied.len())]
pub struct ApplyError {
    /// Operations that succeeded before the failure.
    pub applied: Vec<Operation>,
    /// The operation the authority rejected.
    pub failed: Operation,
    /// The authority's error.
    #[source]
    pub source: SessionError,
}

/// Compute the operations that converge `current` onto `grant`.
///
/// Under [`GrantsMode::Enforce`], each held privilege whose base name is not
/// desired is revoked, in `current` order. Then every desired privilege is
/// granted, in input order. `current` is ignored under [`GrantsMode::Append`].
///
/// Revoke statements name the base privilege only: `REVOKE` takes no option
/// clause, and revoking the base removes any option held with it. The held
/// privilege, option included, is kept on [`Operation::Revoke`].
pub fn plan(grant: &PrivilegeGrant, current: &[Privilege]) -> Result<Plan> {
    let kind = grant.kind();
    let grantee = sql::identifier(&grant.principal)?;
    let on = grant.target.on_clause()?;
    let desired = grant.desired()?;

    let mut operations = Vec::new();

    if grant.mode == GrantsMode::Enforce {
        let wanted: HashSet<String> = desired.iter().map(Privilege::key).collect();
        for held in current {
            if wanted.contains(&held.key()) {
                continue;
            }
            let name = kind.render_name(held.name())?;
            operations.push(Operation::Revoke {
                privilege: held.clone(),
                statement: Statement::new(format!("REVOKE {name}{on} FROM {grantee}")),
            });
        }
    }

    if kind.batches_grants() {
        let (with_option, plain): (Vec<Privilege>, Vec<Privilege>) =
            desired.into_iter().partition(Privilege::has_option);
        for batch in [plain, with_option] {
            if batch.is_empty() {
                continue;
            }
            let names = batch
                .iter()
                .map(|p| kind.render_name(p.name()))
                .collect::<Result<Vec<_>>>()?
                .join(", ");
            let clause = option_clause(&batch[0]);
            operations.push(Operation::Grant {
                statement: Statement::new(format!("GRANT {names}{on} TO {grantee}{clause}")),
                privileges: batch,
            });
        }
    } else {
        for privilege in desired {
            let name = kind.render_name(privilege.name())?;
            let clause = option_clause(&privilege);
            operations.push(Operation::Grant {
                statement: Statement::new(format!("GRANT {name}{on} TO {grantee}{clause}")),
                privileges: vec![privilege],
            });
        }
    }

    Ok(Plan {
        kind,
        principal: grant.principal.clone(),
        operations,
    })
}

fn option_clause(privilege: &Privilege) -> String {
    privilege
        .option()
        .map(|option| format!(" {}", option.clause()))
        .unwrap_or_default()
}

/// Execute `plan` in order, stopping at the first failure.
pub fn apply<S: Session + ?Sized>(session: &mut S, plan: Plan) -> Result<Applied> {
    let Plan {
        kind,
        principal,
        operations,
    } = plan;

    let mut applied = Vec::with_capacity(operations.len());
    for operation in operations {
        if let Err(source) = operation.statement().execute(session) {
            tracing::warn!(
                %principal,
                domain = %kind,
                statement = %operation,
                applied = applied.len(),
                %source,
                "reconciliation stopped"
            );
            return Err(ApplyError {
                applied,
                failed: operation,
                source,
            }
            .into());
        }
        tracing::info!(%principal, domain = %kind, statement = %operation, "applied");
        applied.push(operation);
    }
    Ok(Applied {
        operations: applied,
    })
}

/// Plan `grant` against the live catalog. The catalog is only read under enforce.
pub fn plan_against<S: Session + ?Sized>(session: &mut S, grant: &PrivilegeGrant) -> Result<Plan> {
    let current = match grant.mode {
        GrantsMode::Enforce => {
            catalog::current_privileges(session, &grant.principal, &grant.target)?
        }
        GrantsMode::Append => Vec::new(),
    };
    plan(grant, &current)
}

/// Read, plan and apply `grant`.
pub fn reconcile<S: Session + ?Sized>(session: &mut S, grant: &PrivilegeGrant) -> Result<Applied> {
    tracing::debug!(%grant, "reconciling");
    let plan = plan_against(session, grant)?;
    apply(session, plan)
}

impl<S: Session> Client<S> {
    /// Converge `grant` onto the catalog.
    pub fn reconcile(&mut self, grant: &PrivilegeGrant) -> Result<Applied> {
        reconcile(self.session_mut(), grant)
    }

    /// The operations [`Client::reconcile`] would run, without running them.
    pub fn plan(&mut self, grant: &PrivilegeGrant) -> Result<Plan> {
        plan_against(self.session_mut(), grant)
    }

    /// Converge the system privileges of `principal`.
    pub fn grant_system_privileges<P: AsRef<str>>(
        &mut self,
        principal: &str,
        privileges: &[P],
        mode: GrantsMode,
    ) -> Result<Applied> {
        self.reconcile(&PrivilegeGrant::system(principal, privileges, mode))
    }

    /// Converge the privileges of `principal` on an object.
    pub fn grant_object_privileges<P: AsRef<str>>(
        &mut self,
        principal: &str,
        owner: Option<&str>,
        object: &str,
        privileges: &[P],
        mode: GrantsMode,
    ) -> Result<Applied> {
        self.reconcile(&PrivilegeGrant::object(
            principal, owner, object, privileges, mode,
        ))
    }

    /// Converge the privileges of `principal` on a directory.
    pub fn grant_directory_privileges<P: AsRef<str>>(
        &mut self,
        principal: &str,
        directory: &str,
        privileges: &[P],
        mode: GrantsMode,
    ) -> Result<Applied> {
        self.reconcile(&PrivilegeGrant::directory(
            principal, directory, privileges, mode,
        ))
    }

    /// Converge the role memberships of `principal`.
    pub fn grant_roles<P: AsRef<str>>(
        &mut self,
        principal: &str,
        roles: &[P],
        mode: GrantsMode,
    ) -> Result<Applied> {
        self.reconcile(&PrivilegeGrant::roles(principal, roles, mode))
    }

    /// Revoke `roles` from `principal` in one statement. An empty list does nothing.
    pub fn revoke_roles<P: AsRef<str>>(&mut self, principal: &str, roles: &[P]) -> Result<()> {
        if roles.is_empty() {
            return Ok(());
        }
        let grantee = sql::identifier(principal)?;
        let names = roles
            .iter()
            .map(|role| {
                let privilege = Privilege::parse(role.as_ref(), PrivilegeKind::Role)?;
                PrivilegeKind::Role.render_name(privilege.name())
            })
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let statement = Statement::new(format!("REVOKE {names} FROM {grantee}"));
        self.run(&statement)?;
        tracing::info!(%principal, %statement, "revoked roles");
        Ok(())
    }

    /// Privileges `principal` currently holds on `target`.
    pub fn current_privileges(&mut self, principal: &str, target: &Target) -> Result<Vec<Privilege>> {
        catalog::current_privileges(self.session_mut(), principal, target)
    }
}
