use std::fmt::{self, Write};

use crate::converge::{ConvergeReport, GrantOutcome};
use crate::grants::Privilege;

/// Build a markdown drift report for a converge run.
pub fn build_report(report: &ConvergeReport, name: &str) -> String {
    let mut out = String::new();
    let _ = write_report(&mut out, report, name);
    out
}

fn write_report(out: &mut String, report: &ConvergeReport, name: &str) -> fmt::Result {
    writeln!(out, "# oragrant Drift Report: {name}")?;
    writeln!(out)?;

    writeln!(out, "## Summary")?;
    writeln!(out)?;
    let status = if report.has_drift() { "drift found" } else { "converged" };
    writeln!(out, "- Status: {status}")?;
    writeln!(
        out,
        "- Grants drifted: {} of {}",
        report.drifted_grants(),
        report.outcomes.len()
    )?;
    writeln!(out, "- Users created: {}", report.created_users.len())?;
    writeln!(out, "- Users updated: {}", report.modified_users.len())?;
    writeln!(out, "- Roles created: {}", report.created_roles.len())?;
    writeln!(out, "- Directories changed: {}", report.directories.len())?;
    writeln!(out, "- Statements: {}", report.statements.len())?;

    if !report.created_users.is_empty()
        || !report.modified_users.is_empty()
        || !report.created_roles.is_empty()
        || !report.directories.is_empty()
    {
        writeln!(out)?;
        writeln!(out, "## Principals and Directories")?;
        writeln!(out)?;
        for user in &report.created_users {
            writeln!(out, "- created user `{user}`")?;
        }
        for user in &report.modified_users {
            writeln!(out, "- updated user `{user}`")?;
        }
        for role in &report.created_roles {
            writeln!(out, "- created role `{role}`")?;
        }
        for change in &report.directories {
            match &change.previous_path {
                Some(previous) => writeln!(
                    out,
                    "- repointed directory `{}` from `{previous}` to `{}`",
                    change.directory.name, change.directory.path
                )?,
                None => writeln!(
                    out,
                    "- created directory `{}` at `{}`",
                    change.directory.name, change.directory.path
                )?,
            }
        }
    }

    if !report.outcomes.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Grants")?;
        writeln!(out)?;
        writeln!(out, "| Principal | Target | Mode | Missing | Extra | Statements |")?;
        writeln!(out, "|-----------|--------|------|---------|-------|------------|")?;
        for outcome in &report.outcomes {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                outcome.grant.principal,
                outcome.grant.target,
                outcome.grant.mode,
                format_privileges(&outcome.missing),
                format_privileges(&outcome.extra),
                outcome.applied.operations.len()
            )?;
        }
    }

    let unknown: Vec<&GrantOutcome> = report
        .outcomes
        .iter()
        .filter(|o| !o.principal_exists)
        .collect();
    if !unknown.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Warnings")?;
        writeln!(out)?;
        for outcome in unknown {
            writeln!(
                out,
                "- principal `{}` did not exist when its {} grant was reconciled",
                outcome.grant.principal,
                outcome.grant.kind()
            )?;
        }
    }

    Ok(())
}

fn format_privileges(privileges: &[Privilege]) -> String {
    if privileges.is_empty() {
        return "-".to_string();
    }
    privileges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
