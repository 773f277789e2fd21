use std::process::ExitCode;

use contentspec::OutlineNode;
use serde_json::json;

use crate::commands::CommandResult;
use crate::commands::checksum::ChecksumStatus;
use crate::error::CliError;

pub enum OutputFormat {
    Text,
    Json,
}

/// Prints a `CommandResult` as text or as one JSON object and maps it to an exit code.
pub fn emit_result(result: CommandResult, format: OutputFormat) -> Result<ExitCode, CliError> {
    match format {
        OutputFormat::Text => print_text(&result),
        OutputFormat::Json => print_json(&result)?,
    };
    Ok(ExitCode::from(result.exit_status().code()))
}

fn print_text(result: &CommandResult) {
    match result {
        CommandResult::Rendered { text, .. } | CommandResult::ChecksumStripped { text, .. } => {
            print!("{text}");
        }
        CommandResult::Outline { outline, .. } => print_outline(outline, 0),
        CommandResult::Links { links, .. } => {
            for link in links {
                let step = link
                    .step
                    .map(|step| step.to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{step:>4}  {:<14} {} -> {}",
                    link.kind,
                    link.label,
                    link.link_id.as_deref().unwrap_or("(none)")
                );
            }
        }
        CommandResult::ChecksumVerified { reports, healthy } => {
            if *healthy {
                println!("Checksums: OK ({} files)", reports.len());
            } else {
                println!("Checksums: FAIL ({} files)", reports.len());
            }
            for report in reports {
                let label = match report.status {
                    ChecksumStatus::Valid => "OK",
                    ChecksumStatus::Mismatch => "MISMATCH",
                    ChecksumStatus::Missing => "MISSING",
                };
                println!("  [{label}] {}", report.path);
            }
        }
    }
}

fn print_outline(node: &OutlineNode, depth: usize) {
    let step = node
        .step
        .map(|step| format!("{step}. "))
        .unwrap_or_default();
    let name = match (&node.title, &node.id) {
        (Some(title), Some(id)) => format!("{title} [{id}]"),
        (Some(title), None) => title.clone(),
        (None, Some(id)) => format!("[{id}]"),
        (None, None) => String::new(),
    };
    let target = node
        .target_id
        .as_deref()
        .map(|target| format!(" ({target})"))
        .unwrap_or_default();
    println!("{}{step}{}: {name}{target}", "  ".repeat(depth), node.kind);
    for child in &node.children {
        print_outline(child, depth + 1);
    }
}

fn print_json(result: &CommandResult) -> Result<(), CliError> {
    let payload = json!(result);
    println!("{payload}");
    Ok(())
}
