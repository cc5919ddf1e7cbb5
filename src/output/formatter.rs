use std::path::Path;

use crate::converge::ConvergeReport;
use crate::error::{Error, Result};
use crate::output::report;

/// Render the executed statements as a SQL script. Secrets are redacted.
pub fn format_script(report: &ConvergeReport) -> String {
    let mut script = format!("-- oragrant plan: {} statement(s)\n", report.statements.len());
    for statement in &report.statements {
        script.push_str(&statement.to_string());
        script.push_str(";\n");
    }
    script
}

/// Write the plan script and drift report to the specified directory.
pub fn write_output(output_dir: &Path, name: &str, report: &ConvergeReport) -> Result<()> {
    validate_output_name(name)?;

    std::fs::create_dir_all(output_dir)
        .map_err(|e| Error::Output(format!("failed to create output directory: {e}")))?;

    let script_path = output_dir.join(format!("{name}_plan.sql"));
    std::fs::write(&script_path, format_script(report))
        .map_err(|e| Error::Output(format!("failed to write {}: {e}", script_path.display())))?;

    let report_path = output_dir.join(format!("{name}_report.md"));
    std::fs::write(&report_path, report::build_report(report, name))
        .map_err(|e| Error::Output(format!("failed to write {}: {e}", report_path.display())))?;

    tracing::debug!(
        script = %script_path.display(),
        report = %report_path.display(),
        "wrote output"
    );
    Ok(())
}

/// Output names are bare file stems: ASCII letters, digits, `_`, `-` and `.`,
/// not starting with a dot.
fn validate_output_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.starts_with('.') {
        "must not start with a dot"
    } else if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        "only letters, digits, '_', '-' and '.' are allowed"
    } else {
        return Ok(());
    };
    Err(Error::Output(format!("invalid output name '{name}': {reason}")))
}
