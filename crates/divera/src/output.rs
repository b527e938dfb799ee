//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use divera_core::{RefreshState, StateValue};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// An entity state for table cells: unavailable in red, active alarms
/// and `on` in yellow, unknown dimmed.
pub fn paint_state(value: &StateValue, available: bool, color: bool) -> String {
    let text = if available {
        value.to_string()
    } else {
        "unavailable".to_owned()
    };
    if !color {
        return text;
    }
    match (value, available) {
        (_, false) => text.red().to_string(),
        (StateValue::Bool(true), true) => text.yellow().bold().to_string(),
        (StateValue::Unknown, true) => text.dimmed().to_string(),
        _ => text,
    }
}

pub fn paint_refresh_state(state: RefreshState, color: bool) -> String {
    let text = state.to_string();
    if !color {
        return text;
    }
    match state {
        RefreshState::Ready => text.green().to_string(),
        RefreshState::Failed => text.red().to_string(),
        RefreshState::Stopped => text.dimmed().to_string(),
        _ => text.cyan().to_string(),
    }
}

/// Human-readable age, whole seconds only.
pub fn format_age(age: Option<Duration>) -> String {
    age.map_or_else(
        || "never".to_owned(),
        |d| format!("{} ago", humantime::format_duration(Duration::from_secs(d.as_secs()))),
    )
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: builds rows via `to_row`
/// - `json` / `json-compact` / `yaml`: serializes the original data
/// - `plain`: calls `plain_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => data.iter().map(&plain_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are not rows.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => plain_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}
