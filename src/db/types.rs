//! Database type definitions
//!
//! Driver-independent values, column descriptors and the row cursor every
//! handle returns from `execute_rows`.

use crate::error::DbResult;

/// Column descriptor: name plus the driver-reported type name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Type name as the driver reports it (`int4`, `TEXT`, `varchar`, ...)
    pub type_name: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A single value as read from, or sent to, a driver
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// NULL value
    Null,

    /// Integer value
    Integer(i64),

    /// Floating point value
    Float(f64),

    /// Text/string value
    Text(String),

    /// Boolean value
    Boolean(bool),

    /// JSON value (parsed)
    Json(serde_json::Value),

    /// Binary data (BLOB, bytea)
    Binary(Vec<u8>),

    /// Date/time value in the driver's canonical text form
    DateTime(String),

    /// UUID value
    Uuid(String),
}

impl CellValue {
    /// Decode a byte sequence: valid UTF-8 becomes text, anything else stays binary.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(s) => CellValue::Text(s),
            Err(e) => CellValue::Binary(e.into_bytes()),
        }
    }

    /// Full, untruncated display string (`NULL` for null)
    pub fn display(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::Json(v) => v.to_string(),
            CellValue::Binary(b) => match std::str::from_utf8(b) {
                Ok(s) => s.to_string(),
                Err(_) => hex_encode(b),
            },
            CellValue::DateTime(s) => s.clone(),
            CellValue::Uuid(s) => s.clone(),
        }
    }

    /// Check if this is a NULL value
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Whether the value is a JSON object or array (pretty-printed before editing)
    pub fn is_json_document(&self) -> bool {
        match self {
            CellValue::Json(v) => v.is_object() || v.is_array(),
            CellValue::Text(s) => {
                let t = s.trim_start();
                (t.starts_with('{') || t.starts_with('['))
                    && serde_json::from_str::<serde_json::Value>(s)
                        .is_ok_and(|v| v.is_object() || v.is_array())
            }
            _ => false,
        }
    }

    /// Render as a SQL literal. Used for display SQL and INSERT export only,
    /// never for statements that get executed.
    pub fn sql_literal(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) if f.is_finite() => f.to_string(),
            CellValue::Boolean(b) => {
                if *b {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            other => quote_literal(&other.display()),
        }
    }
}

/// Single-quote a string for SQL, doubling embedded quotes
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Bytes typed into an editor: `\x` hex when it parses, UTF-8 otherwise
pub fn bytes_from_text(text: &str) -> Vec<u8> {
    hex_decode(text).unwrap_or_else(|| text.as_bytes().to_vec())
}

/// Hex-encode binary data (e.g. `\xdeadbeef`).
pub fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 2);
    s.push_str("\\x");
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

/// Decode `\xdeadbeef` back into bytes
pub fn hex_decode(s: &str) -> Option<Vec<u8>> {
    let digits = s.strip_prefix("\\x")?;
    if digits.len() % 2 != 0 || !digits.is_ascii() {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
        .collect()
}

/// Rows returned by `DatabaseHandle::execute_rows`.
///
/// Column metadata is known up front; rows are pulled lazily and any item
/// may carry the error that stopped iteration.
pub struct RowCursor {
    columns: Vec<ColumnDef>,
    rows: Box<dyn Iterator<Item = DbResult<Vec<CellValue>>>>,
}

impl RowCursor {
    pub fn new(
        columns: Vec<ColumnDef>,
        rows: impl Iterator<Item = DbResult<Vec<CellValue>>> + 'static,
    ) -> Self {
        Self {
            columns,
            rows: Box::new(rows),
        }
    }

    /// Cursor over already-fetched rows
    pub fn from_rows(columns: Vec<ColumnDef>, rows: Vec<Vec<CellValue>>) -> Self {
        Self::new(columns, rows.into_iter().map(Ok))
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }
}

impl Iterator for RowCursor {
    type Item = DbResult<Vec<CellValue>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}

impl std::fmt::Debug for RowCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowCursor")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}
