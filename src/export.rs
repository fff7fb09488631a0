//! Selection export (CSV / TSV / JSON / Markdown / HTML / SQL)
//!
//! Pure serialization functions. The controller hands the returned text to
//! the clipboard.

use crate::clipboard::Clipboard;
use crate::db::{CellValue, Dialect};
use crate::error::ExportError;
use crate::grid::ResultGrid;
use crate::ui::viewport::SelectionRect;

/// Export format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
    Json,
    Markdown,
    Html,
    Sql,
}

impl ExportFormat {
    /// Follow-up key after `y`
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            'c' => Some(Self::Csv),
            't' => Some(Self::Tsv),
            'j' => Some(Self::Json),
            'm' => Some(Self::Markdown),
            'h' => Some(Self::Html),
            's' => Some(Self::Sql),
            _ => None,
        }
    }

    /// Name used in banners
    pub fn label(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Tsv => "TSV",
            Self::Json => "JSON",
            Self::Markdown => "Markdown",
            Self::Html => "HTML",
            Self::Sql => "SQL",
        }
    }
}

/// A rectangular slice of a grid
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub headers: Vec<String>,
    /// `None` is SQL NULL
    pub rows: Vec<Vec<Option<CellValue>>>,
    /// Target of SQL export; empty when the grid is read-only
    pub table_name: String,
    pub dialect: Dialect,
}

impl Selection {
    pub fn from_grid(grid: &ResultGrid, rect: &SelectionRect) -> Self {
        let headers = rect
            .cols
            .clone()
            .filter_map(|c| grid.columns.get(c).map(|col| col.name.clone()))
            .collect();
        let rows = rect
            .rows
            .clone()
            .filter_map(|r| grid.rows.get(r))
            .map(|row| {
                rect.cols
                    .clone()
                    .filter_map(|c| row.cell(c).map(|cell| cell.raw_value.clone()))
                    .collect()
            })
            .collect();
        Self {
            headers,
            rows,
            table_name: grid.table_name.clone(),
            dialect: grid.dialect,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Display strings, `NULL` for null
    fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(display).collect())
            .collect()
    }
}

fn display(value: &Option<CellValue>) -> String {
    value
        .as_ref()
        .map_or_else(|| "NULL".to_string(), CellValue::display)
}

/// Serialize `selection` in `format`
pub fn export(selection: &Selection, format: ExportFormat) -> Result<String, ExportError> {
    if selection.rows.is_empty() || selection.headers.is_empty() {
        return Err(ExportError::EmptySelection);
    }
    match format {
        ExportFormat::Csv => Ok(to_csv(selection)),
        ExportFormat::Tsv => Ok(to_tsv(selection)),
        ExportFormat::Json => to_json(selection),
        ExportFormat::Markdown => Ok(to_markdown(selection)),
        ExportFormat::Html => Ok(to_html(selection)),
        ExportFormat::Sql => to_sql(selection),
    }
}

/// Serialize and push to the clipboard; returns the success banner
pub fn copy_selection(
    clipboard: &mut dyn Clipboard,
    selection: &Selection,
    format: ExportFormat,
) -> Result<String, ExportError> {
    let text = export(selection, format)?;
    clipboard.set_text(&text)?;
    Ok(format!(
        "Copied {} cells as {} to clipboard",
        selection.cell_count(),
        format.label()
    ))
}

/// RFC 4180 CSV, header line first
pub fn to_csv(selection: &Selection) -> String {
    let mut out = String::new();
    push_delimited(&mut out, &selection.headers, ',', csv_escape_into);
    for row in selection.text_rows() {
        push_delimited(&mut out, &row, ',', csv_escape_into);
    }
    out
}

/// Tab-separated; embedded tabs and newlines pass through unchanged
pub fn to_tsv(selection: &Selection) -> String {
    let mut out = String::new();
    push_delimited(&mut out, &selection.headers, '\t', |o, f| o.push_str(f));
    for row in selection.text_rows() {
        push_delimited(&mut out, &row, '\t', |o, f| o.push_str(f));
    }
    out
}

fn push_delimited(out: &mut String, fields: &[String], sep: char, escape: impl Fn(&mut String, &str)) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        escape(out, field);
    }
    out.push('\n');
}

/// Array of objects keyed by column name; every value is a string.
///
/// Repeated column names get a numeric suffix (`id`, `id_2`) so no column
/// is lost.
pub fn to_json(selection: &Selection) -> Result<String, ExportError> {
    let keys = unique_keys(&selection.headers);
    let rows: Vec<serde_json::Value> = selection
        .text_rows()
        .into_iter()
        .map(|row| {
            let obj: serde_json::Map<String, serde_json::Value> = keys
                .iter()
                .cloned()
                .zip(row.into_iter().map(serde_json::Value::String))
                .collect();
            serde_json::Value::Object(obj)
        })
        .collect();
    serde_json::to_string_pretty(&rows).map_err(|e| ExportError::Serialize(e.to_string()))
}

fn unique_keys(headers: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let mut key = header.clone();
        let mut n = 2;
        while keys.contains(&key) || (key != *header && headers.contains(&key)) {
            key = format!("{}_{}", header, n);
            n += 1;
        }
        keys.push(key);
    }
    keys
}

/// GitHub-flavoured Markdown table
pub fn to_markdown(selection: &Selection) -> String {
    let mut out = String::new();
    let line = |out: &mut String, fields: &[String]| {
        out.push('|');
        for f in fields {
            out.push(' ');
            out.push_str(&markdown_escape(f));
            out.push_str(" |");
        }
        out.push('\n');
    };
    line(&mut out, &selection.headers);
    out.push('|');
    for _ in &selection.headers {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in selection.text_rows() {
        line(&mut out, &row);
    }
    out
}

fn markdown_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

const HTML_STYLE: &str = "table{border-collapse:collapse;font-family:sans-serif}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:left}\
th{background:#f0f0f0}tr.odd td{background:#fafafa}";

/// Standalone HTML document with one table
pub fn to_html(selection: &Selection) -> String {
    let mut out = String::from("<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<style>{}</style>\n</head>\n<body>\n<table>\n", HTML_STYLE));
    out.push_str("<thead><tr>");
    for h in &selection.headers {
        out.push_str(&format!("<th>{}</th>", html_escape(h)));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for (i, row) in selection.text_rows().iter().enumerate() {
        let class = if i % 2 == 0 { "even" } else { "odd" };
        out.push_str(&format!("<tr class=\"{}\">", class));
        for v in row {
            out.push_str(&format!("<td>{}</td>", html_escape(v)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    out
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// One `INSERT` per row into the grid's table
pub fn to_sql(selection: &Selection) -> Result<String, ExportError> {
    if selection.table_name.is_empty() {
        return Err(ExportError::MissingTable);
    }
    let columns: Vec<String> = selection
        .headers
        .iter()
        .map(|h| selection.dialect.quote_identifier(h))
        .collect();
    let columns = columns.join(", ");
    let mut out = String::new();
    for row in &selection.rows {
        let values: Vec<String> = row
            .iter()
            .map(|v| v.as_ref().map_or_else(|| "NULL".to_string(), CellValue::sql_literal))
            .collect();
        out.push_str(&format!(
            "INSERT INTO {} ({}) VALUES ({});\n",
            selection.table_name,
            columns,
            values.join(", ")
        ));
    }
    Ok(out)
}

/// Quote a field if it contains `,` `"` or a newline (RFC 4180).
fn csv_escape_into(out: &mut String, field: &str) {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push_str("\"\"");
            } else {
                out.push(c);
            }
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}
