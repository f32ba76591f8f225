//! Human-readable rendering of records, reports, and summaries.

use crate::api::StatusSummary;
use crate::batch::{BatchOp, BatchReport};
use crate::catalog::{MetadataRecord, CUSTOM_FIELD_1_LABEL, CUSTOM_FIELD_2_LABEL};
use crate::index::IndexReport;
use crate::vcs::{ClassifyOutcome, VcsStatus};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Bold, underlined section heading.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Status string colored by severity.
pub fn format_vcs_status(status: VcsStatus) -> String {
    let text = status.as_str();
    match status {
        VcsStatus::UpToDate => format!("{}", text.green()),
        VcsStatus::Unknown => format!("{}", text.dimmed()),
        VcsStatus::Untracked | VcsStatus::Added => format!("{}", text.cyan()),
        VcsStatus::Deleted => format!("{}", text.red()),
        _ => format!("{}", text.yellow()),
    }
}

/// `1536` -> `1.5 KiB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

pub fn format_record_table(records: &[&MetadataRecord]) -> String {
    if records.is_empty() {
        return "No matching items.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Id", "Name", "Type", "Size", "Tags", "Category", "VCS"]);
    for record in records {
        table.add_row(vec![
            record.id.chars().take(8).collect::<String>(),
            record.name.clone(),
            record.type_tag.clone(),
            format_size(record.size_bytes),
            record.tags.joined(),
            or_dash(record.category.as_deref()),
            record.vcs_status.as_str().to_string(),
        ]);
    }
    format!("{}\n{} item(s)", table, records.len())
}

pub fn format_record_detail(record: &MetadataRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading(&record.name)));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    let join = |set: &std::collections::BTreeSet<String>| {
        if set.is_empty() {
            "-".to_string()
        } else {
            set.iter().cloned().collect::<Vec<_>>().join("\n")
        }
    };
    let rows: Vec<(&str, String)> = vec![
        ("Id", record.id.clone()),
        ("Path", record.path.clone()),
        ("Type", record.type_tag.clone()),
        ("Size", format_size(record.size_bytes)),
        ("Duration", format!("{:.2} s", record.audio_duration_seconds)),
        ("Tags", or_dash(Some(record.tags.joined().as_str()).filter(|t| !t.is_empty()))),
        ("Category", or_dash(record.category.as_deref())),
        (CUSTOM_FIELD_1_LABEL, or_dash(record.custom_field_1.as_deref())),
        (CUSTOM_FIELD_2_LABEL, or_dash(record.custom_field_2.as_deref())),
        ("Dependencies", join(&record.direct_dependencies)),
        ("Dependants", join(&record.direct_dependants)),
        ("VCS", format!("{} / {}", record.vcs_system, format_vcs_status(record.vcs_status))),
        ("Last indexed", record.last_indexed.to_rfc3339()),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }
    out.push_str(&table.to_string());
    out
}

pub fn format_index_report(report: &IndexReport) -> String {
    let mut lines = Vec::new();
    let scope = if report.scope_roots.is_empty() {
        "selected items".to_string()
    } else {
        report.scope_roots.join(", ")
    };
    lines.push(format!("Indexed {} in {} ms", scope, report.elapsed_ms));
    if report.fell_back {
        lines.push("  No valid scope roots given; indexed the entire corpus".to_string());
    }
    lines.push(format!(
        "  Added: {}  Kept: {}  Dropped: {}  Carried: {}",
        report.added, report.kept, report.dropped, report.carried
    ));
    lines.push(format!("  Dependency edges: {}", report.graph.edges));
    if report.degraded > 0 {
        lines.push(format!("  Degraded fields: {}", report.degraded.yellow()));
    }
    lines.push(match &report.vcs {
        ClassifyOutcome::NotDetected => "  Version control: none detected".to_string(),
        ClassifyOutcome::Classified { system, changed } => {
            format!("  Version control: {} ({} changed)", system, changed)
        }
        ClassifyOutcome::Failed { system, message } => {
            format!("  Version control: {} {} ({})", system, "failed".red(), message)
        }
    });
    lines.join("\n")
}

pub fn format_batch_report(op: &BatchOp, report: &BatchReport) -> String {
    if report.skipped {
        return format!("Nothing to do: {} needs a non-blank value", op);
    }
    format!("{}: {} of {} item(s) changed", op, report.changed, report.targeted)
}

pub fn format_status_summary(summary: &StatusSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Catalog")));
    out.push_str(&format!("  Items: {}\n", summary.total));
    out.push_str(&format!("  Total size: {}\n", format_size(summary.total_bytes)));
    out.push_str(&format!("  Untagged: {}\n", summary.untagged));
    out.push_str(&format!("  Uncategorized: {}\n", summary.uncategorized));
    out.push_str(&format!("  Dependency edges: {}\n", summary.edges));
    if summary.unsaved_changes {
        out.push_str(&format!("  {}\n", "Unsaved changes".yellow()));
    }
    out.push('\n');

    let system = summary
        .vcs_system
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string());
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Version control ({})", system))
    ));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Status", "Items"]);
    for (status, count) in &summary.by_status {
        table.add_row(vec![status.clone(), count.to_string()]);
    }
    out.push_str(&format!("{}\n\n", table));

    out.push_str(&format!("{}\n\n", format_section_heading("Types")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Type", "Items"]);
    for (type_tag, count) in &summary.by_type {
        table.add_row(vec![type_tag.clone(), count.to_string()]);
    }
    out.push_str(&table.to_string());
    out
}
