//! Rendering of a filtered policy
//!
//! YAML and JSON render the policy document itself; CSV and table render the
//! flattened (principal_type, principal, role) records.

use crate::error::Result;
use crate::{FlatRecord, Policy};
use clap::ValueEnum;
use comfy_table::{ContentArrangement, Table};

/// Column headers for flattened output
pub const FLAT_HEADERS: [&str; 3] = ["principal_type", "principal", "role"];

/// Output format for the filtered policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    Csv,
    Table,
}

/// Render a policy in the given format
pub fn render(policy: &Policy, format: OutputFormat) -> Result<String> {
    let out = match format {
        OutputFormat::Yaml => serde_yaml::to_string(&policy.to_document())?,
        OutputFormat::Json => serde_json::to_string_pretty(&policy.to_document())?,
        OutputFormat::Csv => format_as_csv(&policy.to_flat_records()),
        OutputFormat::Table => format_as_table(&policy.to_flat_records()),
    };
    Ok(out)
}

/// Sorted, newline separated list (used for roles-only / users-only output)
pub fn render_lines<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut lines: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    lines.sort();
    lines.join("\n")
}

/// Escape a value for CSV output.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_as_csv(records: &[FlatRecord]) -> String {
    let mut out = String::new();
    out.push_str(&FLAT_HEADERS.join(","));
    out.push('\n');

    for r in records {
        let cells = [r.principal_type.as_str(), r.principal.as_str(), r.role.as_str()];
        out.push_str(
            &cells
                .iter()
                .map(|c| csv_escape(c))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push('\n');
    }

    out
}

fn format_as_table(records: &[FlatRecord]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(FLAT_HEADERS);

    for r in records {
        table.add_row(vec![
            r.principal_type.to_string(),
            r.principal.clone(),
            r.role.clone(),
        ]);
    }

    table.to_string()
}
