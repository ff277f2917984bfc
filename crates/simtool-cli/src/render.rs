//! Terminal and JSON output

use serde::Serialize;
use simtool_core::{Outcome, PlannedStep, Report, ToolState, ToolStatus};

use crate::doctor::Diagnostics;

/// Print `value` as pretty JSON on stdout
fn print_json<T: Serialize + ?Sized>(value: &T) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Left-aligned columns sized to the widest cell
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        line.trim_end().to_string()
    };

    let mut out = format_row(headers.to_vec());
    for row in rows {
        out.push('\n');
        out.push_str(&format_row(row.iter().map(String::as_str).collect()));
    }
    out
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn status_rows(statuses: &[ToolStatus]) -> Vec<Vec<String>> {
    statuses
        .iter()
        .map(|s| {
            vec![
                s.tool_id.clone(),
                s.state.to_string(),
                or_dash(s.installed_version.as_deref()),
                or_dash(s.latest_version.as_deref()),
            ]
        })
        .collect()
}

pub fn statuses(statuses: &[ToolStatus], json: bool) -> eyre::Result<()> {
    if json {
        return print_json(statuses);
    }
    if statuses.is_empty() {
        println!("nothing to report");
        return Ok(());
    }
    println!(
        "{}",
        table(&["TOOL", "STATUS", "INSTALLED", "LATEST"], &status_rows(statuses))
    );
    Ok(())
}

fn planned_action(status: &ToolStatus) -> &'static str {
    match status.state {
        ToolState::NotInstalled | ToolState::Unknown => "install",
        ToolState::Installed | ToolState::UpdateAvailable => "keep",
    }
}

pub fn plan(steps: &[PlannedStep], json: bool) -> eyre::Result<()> {
    if json {
        return print_json(steps);
    }
    let rows: Vec<Vec<String>> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            vec![
                (i + 1).to_string(),
                step.tool.id.clone(),
                step.status.state.to_string(),
                planned_action(&step.status).to_string(),
            ]
        })
        .collect();
    println!("{}", table(&["#", "TOOL", "STATUS", "ACTION"], &rows));
    Ok(())
}

fn summary(report: &Report) -> String {
    let total = report.results.len();
    let failed = report
        .results
        .iter()
        .filter(|r| r.outcome == Outcome::Failed)
        .count();
    let skipped = report
        .results
        .iter()
        .filter(|r| r.outcome == Outcome::Skipped)
        .count();

    match (failed, skipped) {
        (0, 0) if total == 0 => format!("{}: nothing to do", report.command),
        (0, 0) => format!("{}: ok", report.command),
        _ => format!(
            "{}: {failed} failed, {skipped} skipped, {} succeeded",
            report.command,
            total - failed - skipped
        ),
    }
}

pub fn report(report: &Report, json: bool) -> eyre::Result<()> {
    if json {
        return print_json(report);
    }
    if !report.results.is_empty() {
        let rows: Vec<Vec<String>> = report
            .results
            .iter()
            .map(|r| vec![r.tool_id.clone(), r.outcome.to_string(), r.message.clone()])
            .collect();
        println!("{}", table(&["TOOL", "RESULT", "MESSAGE"], &rows));
    }
    println!("{}", summary(report));
    Ok(())
}

pub fn diagnostics(diagnostics: &Diagnostics, json: bool) -> eyre::Result<()> {
    if json {
        return print_json(diagnostics);
    }
    let distro = diagnostics
        .distro
        .as_ref()
        .map(|d| format!("{} {}", d.name, d.version_id).trim().to_string());
    let rows = vec![
        vec!["platform".to_string(), diagnostics.platform.to_string()],
        vec!["distribution".to_string(), or_dash(distro.as_deref())],
        vec![
            "package manager".to_string(),
            format!(
                "{} ({})",
                diagnostics.package_manager,
                if diagnostics.manager_available { "found" } else { "not found on PATH" }
            ),
        ],
        vec!["sudo".to_string(), diagnostics.use_sudo.to_string()],
        vec![
            "registry".to_string(),
            or_dash(diagnostics.registry_source.as_deref()),
        ],
        vec![
            "tools".to_string(),
            match &diagnostics.registry_error {
                Some(error) => format!("{} ({error})", diagnostics.tool_count),
                None => diagnostics.tool_count.to_string(),
            },
        ],
    ];
    println!("{}", table(&["CHECK", "VALUE"], &rows));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use simtool_core::OperationResult;

    #[test]
    fn test_table_alignment() {
        let rows = vec![
            vec!["ngspice".to_string(), "update available".to_string()],
            vec!["kicad".to_string(), "installed".to_string()],
        ];
        let out = table(&["TOOL", "STATUS"], &rows);
        assert_eq!(
            out,
            "TOOL     STATUS\nngspice  update available\nkicad    installed"
        );
    }

    #[test]
    fn test_status_rows() {
        let statuses = vec![ToolStatus {
            tool_id: "ngspice".to_string(),
            state: ToolState::UpdateAvailable,
            installed_version: Some("38".to_string()),
            latest_version: Some("40".to_string()),
        }];
        assert_eq!(
            status_rows(&statuses),
            vec![vec!["ngspice", "update available", "38", "40"]]
        );
    }

    #[test]
    fn test_summary() {
        let mut report = Report::new("install xyce");
        assert_eq!(summary(&report), "install xyce: nothing to do");

        report.push(OperationResult::failed("ngspice", "E: lock"));
        report.push(OperationResult::skipped("xyce", "not attempted"));
        assert_eq!(
            summary(&report),
            "install xyce: 1 failed, 1 skipped, 0 succeeded"
        );
    }
}
