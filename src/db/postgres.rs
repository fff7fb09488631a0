//! PostgreSQL database handle
//!
//! Concrete implementation using tokio-postgres, driven by a private
//! current-thread runtime so callers see a blocking `DatabaseHandle`.

use crate::config::connections::{Endpoint, SslMode};
use crate::db::dialect::Dialect;
use crate::db::handle::DatabaseHandle;
use crate::db::metadata::{ForeignKey, TableMetadata};
use crate::db::types::{self, CellValue, ColumnDef, RowCursor};
use crate::error::{DbError, DbResult};
use bytes::BytesMut;
use rust_decimal::Decimal;
use std::error::Error as StdError;
use std::str::FromStr;
use tokio::runtime::Runtime;
use tokio_postgres::Client;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};

/// PostgreSQL database handle
pub struct PostgresHandle {
    /// Runtime that owns the connection task
    runtime: Runtime,
    /// The tokio-postgres client
    client: Client,
}

impl PostgresHandle {
    /// Connect to a PostgreSQL database.
    ///
    /// The background connection task lives on the handle's runtime and only
    /// makes progress while a query is being awaited.
    pub fn connect(endpoint: &Endpoint) -> DbResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        let conn_string = endpoint.postgres_connection_string();

        let client = match endpoint.ssl_mode {
            SslMode::Disable => {
                let (client, connection) = runtime
                    .block_on(tokio_postgres::connect(&conn_string, tokio_postgres::NoTls))
                    .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
                runtime.spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::error!(error = %e, "postgres connection lost");
                    }
                });
                client
            }
            SslMode::Prefer | SslMode::Require => {
                let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_tls_config());
                let (client, connection) = runtime
                    .block_on(tokio_postgres::connect(&conn_string, tls))
                    .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
                runtime.spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::error!(error = %e, "postgres connection lost");
                    }
                });
                client
            }
        };

        tracing::info!(host = %endpoint.host, database = %endpoint.database, "connected to postgres");
        Ok(Self { runtime, client })
    }

    fn query_metadata(&self, table: &str) -> Result<TableMetadata, tokio_postgres::Error> {
        self.runtime.block_on(async {
            let column_rows = self
                .client
                .query(
                    "SELECT a.attname, format_type(a.atttypid, a.atttypmod) \
                     FROM pg_attribute a \
                     WHERE a.attrelid = to_regclass($1) \
                       AND a.attnum > 0 AND NOT a.attisdropped \
                     ORDER BY a.attnum",
                    &[&table],
                )
                .await?;

            // PK + FK constraints, key columns in constraint order
            let constraint_rows = self
                .client
                .query(
                    "SELECT con.contype::text, a.attname, \
                            fc.relname AS fk_table, fa.attname AS fk_col \
                     FROM pg_constraint con \
                     JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS u(attnum, ord) ON true \
                     JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = u.attnum \
                     LEFT JOIN pg_class fc ON fc.oid = con.confrelid \
                     LEFT JOIN LATERAL unnest(con.confkey) WITH ORDINALITY AS fu(attnum, ord) ON fu.ord = u.ord \
                     LEFT JOIN pg_attribute fa ON fa.attrelid = fc.oid AND fa.attnum = fu.attnum \
                     WHERE con.conrelid = to_regclass($1) \
                       AND con.contype IN ('p', 'f') \
                     ORDER BY con.contype, con.conname, u.ord",
                    &[&table],
                )
                .await?;

            let mut meta = TableMetadata::default();
            for row in &column_rows {
                meta.columns.push(row.get(0));
                meta.column_types.push(row.get(1));
            }
            for row in &constraint_rows {
                let kind: String = row.get(0);
                let column: String = row.get(1);
                if kind == "p" {
                    meta.primary_keys.push(column);
                } else {
                    meta.foreign_keys.push(ForeignKey {
                        column,
                        referenced_table: row.get::<_, Option<String>>(2).unwrap_or_default(),
                        referenced_column: row.get::<_, Option<String>>(3).unwrap_or_default(),
                    });
                }
            }
            Ok(meta)
        })
    }
}

impl PostgresHandle {
    /// Replace the raw wire values in column `idx` with the server's text
    /// output for `ty`, the same text `column::text` compares against
    fn render_as_text(&self, rows: &mut [Vec<CellValue>], idx: usize, ty: &Type) {
        let raw: Vec<CellValue> = rows
            .iter()
            .filter_map(|row| row.get(idx))
            .filter(|v| matches!(v, CellValue::Binary(_)))
            .cloned()
            .collect();
        if raw.is_empty() {
            return;
        }
        let rendered = self.server_text(ty, &raw).unwrap_or_else(|e| {
            tracing::warn!(type_name = ty.name(), error = %db_message(&e), "text rendering failed");
            Vec::new()
        });
        let mut rendered = rendered.into_iter();
        for cell in rows.iter_mut().filter_map(|row| row.get_mut(idx)) {
            if matches!(cell, CellValue::Binary(_)) {
                *cell = rendered
                    .next()
                    .map_or_else(|| unable_to_display(ty.name()), CellValue::Text);
            }
        }
    }

    /// `SELECT ($1::ty)::text, ($2::ty)::text, ...` over the raw values
    fn server_text(&self, ty: &Type, raw: &[CellValue]) -> Result<Vec<String>, tokio_postgres::Error> {
        const CHUNK: usize = 1000;
        let cast = qualified_type(ty);
        let mut out = Vec::with_capacity(raw.len());
        for chunk in raw.chunks(CHUNK) {
            let select: Vec<String> = (1..=chunk.len())
                .map(|i| format!("(${}::{})::text", i, cast))
                .collect();
            let sql = format!("SELECT {}", select.join(", "));
            let params: Vec<PgArg<'_>> = chunk.iter().map(PgArg).collect();
            let refs: Vec<&(dyn ToSql + Sync)> =
                params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
            let row = self.runtime.block_on(self.client.query_one(sql.as_str(), &refs))?;
            for i in 0..chunk.len() {
                out.push(row.try_get(i)?);
            }
        }
        Ok(out)
    }
}

impl DatabaseHandle for PostgresHandle {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute_rows(&self, sql: &str, args: &[CellValue]) -> DbResult<RowCursor> {
        let params: Vec<PgArg<'_>> = args.iter().map(PgArg).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let (types, pg_rows) = self
            .runtime
            .block_on(async {
                let stmt = self.client.prepare(sql).await?;
                let rows = self.client.query(&stmt, &refs).await?;
                let types: Vec<(String, Type)> = stmt
                    .columns()
                    .iter()
                    .map(|col| (col.name().to_string(), col.type_().clone()))
                    .collect();
                Ok::<_, tokio_postgres::Error>((types, rows))
            })
            .map_err(|e| DbError::QueryFailed(db_message(&e)))?;

        let width = types.len();
        let mut rows: Vec<Vec<CellValue>> = pg_rows
            .iter()
            .map(|pg_row| (0..width).map(|i| extract_cell_value(pg_row, i)).collect())
            .collect();
        for (idx, (_, ty)) in types.iter().enumerate() {
            if is_opaque(ty) {
                self.render_as_text(&mut rows, idx, ty);
            }
        }

        let columns = types
            .iter()
            .map(|(name, ty)| ColumnDef::new(name.as_str(), ty.name()))
            .collect();
        Ok(RowCursor::new(columns, rows.into_iter().map(Ok)))
    }

    fn execute(&self, sql: &str, args: &[CellValue]) -> DbResult<u64> {
        let params: Vec<PgArg<'_>> = args.iter().map(PgArg).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        self.runtime
            .block_on(self.client.execute(sql, &refs))
            .map_err(|e| DbError::QueryFailed(db_message(&e)))
    }

    fn table_metadata(&self, table: &str) -> DbResult<TableMetadata> {
        let meta = self
            .query_metadata(table)
            .map_err(|e| DbError::MetadataFailed(db_message(&e)))?;
        if meta.columns.is_empty() {
            return Err(DbError::TableNotFound(table.to_string()));
        }
        Ok(meta)
    }
}

/// Prefer the server's message over tokio-postgres' generic "db error"
fn db_message(e: &tokio_postgres::Error) -> String {
    match e.as_db_error() {
        Some(db) => db.message().to_string(),
        None => e.to_string(),
    }
}

/// Build a rustls ClientConfig that trusts OS certificates (with Mozilla roots as fallback)
fn make_tls_config() -> rustls::ClientConfig {
    let mut root_store = rustls::RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();
    let mut loaded = 0;
    for cert in native_certs.certs {
        if root_store.add(cert).is_ok() {
            loaded += 1;
        }
    }
    if loaded == 0 {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

/// Bind a [`CellValue`] to whatever parameter type the server inferred.
///
/// Edited values arrive as text; observed values keep the type they were
/// read with. Both are converted to the parameter's wire type here.
#[derive(Debug)]
struct PgArg<'a>(&'a CellValue);

type BoxError = Box<dyn StdError + Sync + Send>;

impl ToSql for PgArg<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        let value = self.0;
        if value.is_null() {
            return Ok(IsNull::Yes);
        }
        let text = value.display();
        let trimmed = text.trim();

        match *ty {
            Type::BOOL => parse_bool(trimmed)?.to_sql(ty, out),
            Type::INT2 => trimmed.parse::<i16>()?.to_sql(ty, out),
            Type::INT4 => trimmed.parse::<i32>()?.to_sql(ty, out),
            Type::INT8 => trimmed.parse::<i64>()?.to_sql(ty, out),
            Type::OID => trimmed.parse::<u32>()?.to_sql(ty, out),
            Type::FLOAT4 => trimmed.parse::<f32>()?.to_sql(ty, out),
            Type::FLOAT8 => trimmed.parse::<f64>()?.to_sql(ty, out),
            Type::NUMERIC => Decimal::from_str(trimmed)?.to_sql(ty, out),
            Type::JSON | Type::JSONB => {
                let json = match value {
                    CellValue::Json(v) => v.clone(),
                    _ => serde_json::from_str(&text)?,
                };
                json.to_sql(ty, out)
            }
            Type::UUID => uuid::Uuid::parse_str(trimmed)?.to_sql(ty, out),
            Type::TIMESTAMP => parse_timestamp(trimmed)?.to_sql(ty, out),
            Type::TIMESTAMPTZ => parse_timestamptz(trimmed)?.to_sql(ty, out),
            Type::DATE => chrono::NaiveDate::from_str(trimmed)?.to_sql(ty, out),
            Type::TIME => chrono::NaiveTime::from_str(trimmed)?.to_sql(ty, out),
            Type::BYTEA => match value {
                CellValue::Binary(b) => b.as_slice().to_sql(ty, out),
                _ => match types::hex_decode(trimmed) {
                    Some(bytes) => bytes.as_slice().to_sql(ty, out),
                    None => text.as_bytes().to_sql(ty, out),
                },
            },
            // raw wire bytes go back as they came
            _ => match value {
                CellValue::Binary(b) => {
                    out.extend_from_slice(b);
                    Ok(IsNull::No)
                }
                _ if is_textual(ty) => {
                    out.extend_from_slice(text.as_bytes());
                    Ok(IsNull::No)
                }
                _ => Err(format!("cannot bind {:?} as {}", text, ty.name()).into()),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn parse_bool(s: &str) -> Result<bool, BoxError> {
    match s.to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Ok(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Ok(false),
        other => Err(format!("invalid boolean: {}", other).into()),
    }
}

fn parse_timestamp(s: &str) -> Result<chrono::NaiveDateTime, BoxError> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
    for fmt in FORMATS {
        if let Ok(v) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(v);
        }
    }
    chrono::NaiveDate::from_str(s)?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid timestamp: {}", s).into())
}

fn parse_timestamptz(s: &str) -> Result<chrono::DateTime<chrono::Utc>, BoxError> {
    if let Ok(v) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(v.with_timezone(&chrono::Utc));
    }
    if let Ok(v) = chrono::DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(v.with_timezone(&chrono::Utc));
    }
    // no offset given: treat as UTC
    Ok(parse_timestamp(s)?.and_utc())
}

/// Types read with a native Rust decoder
const NATIVE: [Type; 16] = [
    Type::INT2,
    Type::INT4,
    Type::INT8,
    Type::OID,
    Type::FLOAT4,
    Type::FLOAT8,
    Type::NUMERIC,
    Type::BOOL,
    Type::JSON,
    Type::JSONB,
    Type::BYTEA,
    Type::UUID,
    Type::TIMESTAMP,
    Type::TIMESTAMPTZ,
    Type::DATE,
    Type::TIME,
];

/// Whose binary form is UTF-8 text
fn is_textual(ty: &Type) -> bool {
    <&str as FromSql>::accepts(ty) || matches!(ty.kind(), Kind::Enum(_))
}

/// Neither decoded natively nor textual on the wire (interval, inet,
/// arrays, ranges, geometry, ...)
fn is_opaque(ty: &Type) -> bool {
    !NATIVE.contains(ty) && !is_textual(ty)
}

/// `"schema"."name"` for casts
fn qualified_type(ty: &Type) -> String {
    let quote = |s: &str| format!("\"{}\"", s.replace('"', "\"\""));
    format!("{}.{}", quote(ty.schema()), quote(ty.name()))
}

/// Undecoded column bytes
struct RawValue(Vec<u8>);

impl<'a> FromSql<'a> for RawValue {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Ok(RawValue(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn unable_to_display(type_name: &str) -> CellValue {
    CellValue::Text(format!("<unable to display: {}>", type_name))
}

/// Extract a cell value from a tokio_postgres Row based on the column's type.
///
/// Tries the expected Rust type first and falls back to a string
/// representation if the type doesn't match.
fn extract_cell_value(row: &tokio_postgres::Row, idx: usize) -> CellValue {
    let ty = row.columns()[idx].type_().clone();
    match ty {
        Type::INT2 => typed(row, idx, |v: i16| CellValue::Integer(v as i64)),
        Type::INT4 => typed(row, idx, |v: i32| CellValue::Integer(v as i64)),
        Type::INT8 => typed(row, idx, CellValue::Integer),
        Type::OID => typed(row, idx, |v: u32| CellValue::Integer(v as i64)),
        Type::FLOAT4 => typed(row, idx, |v: f32| CellValue::Float(v as f64)),
        Type::FLOAT8 => typed(row, idx, CellValue::Float),
        Type::NUMERIC => typed(row, idx, |v: Decimal| CellValue::Text(v.to_string())),
        Type::BOOL => typed(row, idx, CellValue::Boolean),
        Type::JSON | Type::JSONB => typed(row, idx, CellValue::Json),
        Type::BYTEA => typed(row, idx, CellValue::Binary),
        Type::UUID => typed(row, idx, |v: uuid::Uuid| CellValue::Uuid(v.to_string())),
        Type::TIMESTAMP => typed(row, idx, |v: chrono::NaiveDateTime| {
            CellValue::DateTime(v.to_string())
        }),
        Type::TIMESTAMPTZ => typed(row, idx, |v: chrono::DateTime<chrono::Utc>| {
            CellValue::DateTime(v.to_rfc3339())
        }),
        Type::DATE => typed(row, idx, |v: chrono::NaiveDate| CellValue::DateTime(v.to_string())),
        Type::TIME => typed(row, idx, |v: chrono::NaiveTime| CellValue::DateTime(v.to_string())),
        _ if matches!(ty.kind(), Kind::Enum(_)) => {
            typed(row, idx, |v: RawValue| CellValue::from_bytes(v.0))
        }
        // rendered by the server once every row is read
        _ if is_opaque(&ty) => typed(row, idx, |v: RawValue| CellValue::Binary(v.0)),
        // Text types and fallback for unknown types
        _ => try_as_string(row, idx),
    }
}

fn typed<'a, T, F>(row: &'a tokio_postgres::Row, idx: usize, wrap: F) -> CellValue
where
    T: tokio_postgres::types::FromSql<'a>,
    F: FnOnce(T) -> CellValue,
{
    match row.try_get::<_, Option<T>>(idx) {
        Ok(Some(v)) => wrap(v),
        Ok(None) => CellValue::Null,
        Err(_) => try_as_string(row, idx),
    }
}

/// Try to extract a value as a string (fallback for type mismatches).
///
/// When even the string fallback fails, includes the postgres type name
/// in the message so the user knows what type couldn't be displayed.
fn try_as_string(row: &tokio_postgres::Row, idx: usize) -> CellValue {
    match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(v)) => CellValue::Text(v),
        Ok(None) => CellValue::Null,
        Err(_) => unable_to_display(
            row.columns()
                .get(idx)
                .map_or("unknown", |c| c.type_().name()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_variants() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(parse_bool("t").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-01-02 03:04:05").is_ok());
        assert!(parse_timestamp("2024-01-02T03:04:05.123").is_ok());
        assert!(parse_timestamp("2024-01-02").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_timestamptz_roundtrips_rfc3339() {
        let ts = parse_timestamptz("2024-01-02T03:04:05+00:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-02T03:04:05+00:00");
        assert!(parse_timestamptz("2024-01-02 03:04:05").is_ok());
    }

    #[test]
    fn test_arg_binds_text_to_int4() {
        let value = CellValue::Text(" 42 ".into());
        let mut buf = BytesMut::new();
        let result = PgArg(&value).to_sql(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(result, IsNull::No));
        assert_eq!(&buf[..], &42i32.to_be_bytes());
    }

    #[test]
    fn test_arg_binds_integer_to_text() {
        let value = CellValue::Integer(7);
        let mut buf = BytesMut::new();
        PgArg(&value).to_sql(&Type::TEXT, &mut buf).unwrap();
        assert_eq!(&buf[..], b"7");
    }

    #[test]
    fn test_arg_null_binds_null() {
        let mut buf = BytesMut::new();
        let result = PgArg(&CellValue::Null).to_sql(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(result, IsNull::Yes));
    }

    #[test]
    fn test_arg_refuses_text_for_opaque_types() {
        let value = CellValue::Text("1 day".into());
        let mut buf = BytesMut::new();
        assert!(PgArg(&value).to_sql(&Type::INTERVAL, &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_arg_passes_raw_bytes_through() {
        let value = CellValue::Binary(vec![0, 0, 0, 1]);
        let mut buf = BytesMut::new();
        PgArg(&value).to_sql(&Type::INET, &mut buf).unwrap();
        assert_eq!(&buf[..], &[0, 0, 0, 1]);
    }

    #[test]
    fn test_opaque_types() {
        assert!(is_opaque(&Type::INTERVAL));
        assert!(is_opaque(&Type::INET));
        assert!(is_opaque(&Type::INT4_ARRAY));
        assert!(is_opaque(&Type::TEXT_ARRAY));
        assert!(!is_opaque(&Type::INT4));
        assert!(!is_opaque(&Type::JSON));
        assert!(!is_opaque(&Type::VARCHAR));
        assert_eq!(qualified_type(&Type::INTERVAL), "\"pg_catalog\".\"interval\"");
    }

    #[test]
    fn test_arg_rejects_bad_integer() {
        let value = CellValue::Text("abc".into());
        let mut buf = BytesMut::new();
        assert!(PgArg(&value).to_sql(&Type::INT8, &mut buf).is_err());
    }
}
