/// Writes the plan script and drift report to disk.
pub mod formatter;
/// Builds a Markdown drift report from a converge run.
pub mod report;
