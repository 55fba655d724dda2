//! Output formatting: table, JSON, YAML, plain.
//!
//! Table uses `tabled`, structured formats use serde, plain emits one
//! identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use xiqsync_core::DeviceStatus;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Status cell, colored when enabled.
pub fn status_cell(status: DeviceStatus, color: bool) -> String {
    match (status, color) {
        (DeviceStatus::Up, true) => status.green().to_string(),
        (DeviceStatus::Down, true) => status.red().to_string(),
        (_, false) => status.to_string(),
    }
}

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
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

/// Pretty-printed JSON.
pub(crate) fn render_json<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(data).map_err(|e| CliError::Api {
        message: format!("cannot encode output as JSON: {e}"),
    })
}

/// YAML output.
pub(crate) fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Api {
        message: format!("cannot encode output as YAML: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        name: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: &'static str,
    }

    fn render(format: OutputFormat) -> String {
        let items = [Item { name: "ap-1" }, Item { name: "sw-2" }];
        render_list(format, &items, |i| Row { name: i.name }, |i| i.name.to_owned())
            .unwrap_or_default()
    }

    #[test]
    fn plain_lists_identifiers() {
        assert_eq!(render(OutputFormat::Plain), "ap-1\nsw-2");
    }

    #[test]
    fn table_has_header() {
        let table = render(OutputFormat::Table);
        assert!(table.contains("Name"));
        assert!(table.contains("sw-2"));
    }

    #[test]
    fn json_is_an_array() {
        let value: serde_json::Value =
            serde_json::from_str(&render(OutputFormat::Json)).unwrap_or_default();
        assert_eq!(value[1]["name"], "sw-2");
    }

    #[test]
    fn status_without_color_is_plain() {
        assert_eq!(status_cell(DeviceStatus::Up, false), "up");
        assert_ne!(status_cell(DeviceStatus::Down, true), "down");
    }
}
