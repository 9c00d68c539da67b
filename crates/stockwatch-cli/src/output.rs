use serde_json::{Map, Value};

use crate::cli::OutputFormat;
use crate::envelope::Envelope;
use crate::error::CliError;

pub fn render(envelope: &Envelope, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(envelope)?),
    }

    Ok(())
}

fn render_table(envelope: &Envelope) -> Result<String, CliError> {
    let mut out = String::new();
    push_line(&mut out, format!("request_id  : {}", envelope.meta.request_id));
    push_line(&mut out, format!("generated_at: {}", envelope.meta.generated_at));
    if let Some(identity) = &envelope.meta.identity {
        push_line(&mut out, format!("identity    : {identity}"));
    }
    push_line(&mut out, format!("latency_ms  : {}", envelope.meta.latency_ms));

    if !envelope.meta.warnings.is_empty() {
        push_line(&mut out, String::from("warnings:"));
        for warning in &envelope.meta.warnings {
            push_line(&mut out, format!("  - {warning}"));
        }
    }

    match &envelope.data {
        Value::Object(fields) => {
            for (name, value) in fields {
                render_field(&mut out, name, value)?;
            }
        }
        other => render_field(&mut out, "data", other)?,
    }

    if !envelope.errors.is_empty() {
        push_line(&mut out, String::from("errors:"));
        for error in &envelope.errors {
            push_line(&mut out, format!("  - {}: {}", error.code, error.message));
        }
    }

    Ok(out)
}

fn render_field(out: &mut String, name: &str, value: &Value) -> Result<(), CliError> {
    match value {
        Value::Array(rows) if !rows.is_empty() && rows.iter().all(Value::is_object) => {
            push_line(out, format!("{name}:"));
            render_rows(out, rows);
        }
        Value::Array(rows) if rows.is_empty() => push_line(out, format!("{name}: (none)")),
        Value::Object(_) => {
            push_line(out, format!("{name}:"));
            for line in serde_json::to_string_pretty(value)?.lines() {
                push_line(out, format!("  {line}"));
            }
        }
        scalar => push_line(out, format!("{name}: {}", cell(scalar))),
    }

    Ok(())
}

/// Columns are the scalar fields of the first row, in key order; nested values
/// are skipped.
fn render_rows(out: &mut String, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let columns: Vec<&str> = first
        .iter()
        .filter(|(_, value)| !value.is_array() && !value.is_object())
        .map(|(name, _)| name.as_str())
        .collect();

    let cells: Vec<Vec<String>> = rows
        .iter()
        .filter_map(Value::as_object)
        .map(|row| columns.iter().map(|column| row_cell(row, column)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            cells
                .iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(column.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns.iter().map(|column| column.to_string()).collect();
    push_line(out, format!("  {}", join_padded(&header, &widths)));
    for row in &cells {
        push_line(out, format!("  {}", join_padded(row, &widths)));
    }
}

fn row_cell(row: &Map<String, Value>, column: &str) -> String {
    row.get(column).map(cell).unwrap_or_default()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}

fn push_line(out: &mut String, line: String) {
    out.push_str(&line);
    out.push('\n');
}
