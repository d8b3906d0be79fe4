//! Terminal rendering of the element list and single records.

use clap::ValueEnum;
use colored::Colorize;
use element_manager_core::{Element, ElementManager, ElementState, NoticeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
    Pretty,
}

/// Ownership marker: `R` remote-owned, `L` locally owned.
fn owner_marker(state: &ElementState, element: &Element) -> &'static str {
    if state.is_remote_owned(element) {
        "R"
    } else {
        "L"
    }
}

fn handle(element: &Element) -> String {
    match element.local_id {
        Some(local_id) => format!("#{}", local_id),
        None => element.id.clone(),
    }
}

fn summary(element: &Element) -> String {
    element
        .data
        .iter()
        .map(|(key, _)| format!("{}={}", key, element.data.text(key)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_list(state: &ElementState, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(state.elements())
            .map_err(|e| format!("JSON serialization failed: {}", e)),
        OutputFormat::Text => Ok(state
            .elements()
            .iter()
            .map(|e| {
                format!(
                    "{}\t{}\t{}\t{}",
                    owner_marker(state, e),
                    handle(e),
                    e.name,
                    summary(e)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Pretty => {
            if state.elements().is_empty() {
                return Ok(format!("{}", "(no elements)".dimmed()));
            }
            let mut lines = Vec::with_capacity(state.elements().len() + 1);
            for e in state.elements() {
                let marker = match owner_marker(state, e) {
                    "R" => "R".cyan(),
                    other => other.yellow(),
                };
                lines.push(format!(
                    "{} {:<34} {:<36} {}",
                    marker,
                    handle(e).bold(),
                    e.name,
                    summary(e).dimmed()
                ));
            }
            let hint = if state.deletes_enabled() {
                "delete enabled".green()
            } else {
                "delete disabled".dimmed()
            };
            lines.push(format!(
                "{} element(s), next local id #{}, {}",
                state.elements().len(),
                state.next_local_id(),
                hint
            ));
            Ok(lines.join("\n"))
        }
    }
}

/// Load once and render. A load that raised an error notice is an error, so a
/// failed fetch is not printed as an empty catalog.
pub async fn load_and_render(
    manager: &mut ElementManager,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let notices = manager.load().await;
    if let Some(failure) = notices.iter().find(|n| n.kind == NoticeKind::Error) {
        anyhow::bail!("{}", failure.message);
    }
    render_list(manager.state(), format).map_err(anyhow::Error::msg)
}

pub fn render_element(element: &Element) -> String {
    let mut lines = Vec::new();
    if !element.id.is_empty() {
        lines.push(format!("{:>12}: {}", "id", element.id));
    }
    if let Some(local_id) = element.local_id {
        lines.push(format!("{:>12}: #{}", "local id", local_id));
    }
    lines.push(format!("{:>12}: {}", "name", element.name.bold()));
    for (key, _) in element.data.iter() {
        lines.push(format!("{:>12}: {}", key, element.data.text(key)));
    }
    lines.join("\n")
}
