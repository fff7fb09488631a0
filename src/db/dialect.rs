//! SQL dialects
//!
//! Placeholder syntax, row-limit rewriting and identifier quoting for every
//! driver querybook knows about.

use crate::sql::keywords;
use std::fmt;

/// Supported database dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
    SqlServer,
    Oracle,
    ClickHouse,
    Firebird,
}

impl Dialect {
    /// Resolve a driver or URL scheme name
    pub fn from_driver(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "sqlserver" | "mssql" => Some(Self::SqlServer),
            "oracle" => Some(Self::Oracle),
            "clickhouse" => Some(Self::ClickHouse),
            "firebird" | "firebirdsql" => Some(Self::Firebird),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::SqlServer => "sqlserver",
            Self::Oracle => "oracle",
            Self::ClickHouse => "clickhouse",
            Self::Firebird => "firebird",
        }
    }

    /// Positional placeholder for the `i`-th argument (1-based)
    pub fn placeholder(&self, i: usize) -> String {
        match self {
            Self::Postgres => format!("${}", i),
            Self::Oracle => format!(":{}", i),
            Self::SqlServer => format!("@p{}", i),
            Self::MySql | Self::Sqlite | Self::ClickHouse | Self::Firebird => "?".to_string(),
        }
    }

    /// Whether placeholders carry their index (`$1`) or are bare (`?`)
    pub fn numbered_placeholders(&self) -> bool {
        matches!(self, Self::Postgres | Self::Oracle | Self::SqlServer)
    }

    /// Cap the number of rows `sql` can return.
    ///
    /// Returns `sql` unchanged when it is not a single row-producing
    /// statement, already carries a limit, or `limit` is zero.
    pub fn apply_row_limit(&self, sql: &str, limit: usize) -> String {
        if limit == 0 {
            return sql.to_string();
        }
        let stmt = keywords::trim_statement(sql);
        if keywords::has_statement_separator(stmt) {
            return sql.to_string();
        }
        let words = keywords::words(stmt);
        let Some(first) = words.first() else {
            return sql.to_string();
        };
        let has_any = |kws: &[&str]| words.iter().any(|w| kws.iter().any(|k| w.is(k)));
        // a CTE prefix must still end in a SELECT
        let selects = first.is("SELECT") || (first.is("WITH") && main_verb_is_select(&words));
        // the cap goes before any trailing comment
        let body = keywords::trim_statement(&stmt[..keywords::code_end(stmt)]);
        let tail = &stmt[body.len()..];

        match self {
            Self::Postgres | Self::MySql | Self::Sqlite | Self::ClickHouse => {
                if !selects || has_any(&["LIMIT"]) {
                    return sql.to_string();
                }
                format!("{} LIMIT {}{}", body, limit, tail)
            }
            Self::SqlServer => {
                if !first.is("SELECT") || has_any(&["TOP", "OFFSET", "FETCH"]) {
                    return sql.to_string();
                }
                let at = match words.get(1) {
                    Some(w) if w.is("DISTINCT") || w.is("ALL") => w.end,
                    _ => first.end,
                };
                format!("{} TOP {}{}", &stmt[..at], limit, &stmt[at..])
            }
            Self::Oracle => {
                if !selects || has_any(&["FETCH", "ROWNUM"]) {
                    return sql.to_string();
                }
                format!("{} FETCH FIRST {} ROWS ONLY{}", body, limit, tail)
            }
            Self::Firebird => {
                if !first.is("SELECT") || has_any(&["FIRST", "ROWS"]) {
                    return sql.to_string();
                }
                format!("{} FIRST {}{}", &stmt[..first.end], limit, &stmt[first.end..])
            }
        }
    }

    /// Quote an identifier unless it reads the same bare: a plain name
    /// that the server would not case-fold and that is not a keyword
    pub fn quote_identifier(&self, ident: &str) -> String {
        let plain = ident
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        let folds = match self {
            Self::Postgres | Self::Sqlite => ident.chars().any(|c| c.is_ascii_uppercase()),
            Self::Oracle | Self::Firebird => ident.chars().any(|c| c.is_ascii_lowercase()),
            Self::MySql | Self::SqlServer | Self::ClickHouse => false,
        };
        if plain && !folds && !is_reserved(ident) {
            return ident.to_string();
        }
        match self {
            Self::MySql | Self::ClickHouse => format!("`{}`", ident.replace('`', "``")),
            Self::SqlServer => format!("[{}]", ident.replace(']', "]]")),
            _ => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Row-filter predicate comparing `column` (already quoted) of type
    /// `type_name` with the value bound at `placeholder`
    pub fn equals(&self, column: &str, type_name: &str, placeholder: &str) -> String {
        match (self, PgBinding::of(type_name)) {
            (Self::Postgres, PgBinding::Json) => format!("{}::jsonb = {}::jsonb", column, placeholder),
            (Self::Postgres, PgBinding::AsText) => format!("{}::text = {}", column, placeholder),
            _ => format!("{} = {}", column, placeholder),
        }
    }

    /// Right-hand side of `SET column = ...` for a textual edit
    pub fn assigned(&self, type_name: &str, placeholder: &str) -> String {
        match (self, PgBinding::of(type_name)) {
            (Self::Postgres, PgBinding::AsText) => {
                format!("{}::text::{}", placeholder, self.quote_identifier(type_name))
            }
            _ => placeholder.to_string(),
        }
    }

    /// Mutations must be spelled `ALTER TABLE ... UPDATE/DELETE`
    pub fn uses_alter_table_mutations(&self) -> bool {
        matches!(self, Self::ClickHouse)
    }

    /// Prefix that asks the server for a query plan
    pub fn explain_prefix(&self) -> &'static str {
        match self {
            Self::Sqlite => "EXPLAIN QUERY PLAN",
            Self::Oracle => "EXPLAIN PLAN FOR",
            _ => "EXPLAIN",
        }
    }

    /// Catalog query listing user tables, one per row
    pub fn tables_query(&self) -> &'static str {
        match self {
            Self::Postgres => {
                "SELECT table_schema, table_name FROM information_schema.tables \
                 WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
                 ORDER BY table_schema, table_name"
            }
            Self::Sqlite => {
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            }
            Self::MySql => "SHOW TABLES",
            Self::ClickHouse => "SHOW TABLES",
            Self::Oracle => "SELECT table_name FROM user_tables ORDER BY table_name",
            Self::Firebird => {
                "SELECT TRIM(rdb$relation_name) AS name FROM rdb$relations \
                 WHERE rdb$system_flag = 0 ORDER BY 1"
            }
            Self::SqlServer => {
                "SELECT table_schema, table_name FROM information_schema.tables \
                 WHERE table_type = 'BASE TABLE' ORDER BY table_schema, table_name"
            }
        }
    }
}

/// Whether the main statement after a `WITH` prefix is a `SELECT`
fn main_verb_is_select(words: &[keywords::Word<'_>]) -> bool {
    const VERBS: [&str; 5] = ["SELECT", "INSERT", "UPDATE", "DELETE", "MERGE"];
    words
        .iter()
        .skip(1)
        .find(|w| w.depth == 0 && VERBS.iter().any(|v| w.is(v)))
        .is_some_and(|w| w.is("SELECT"))
}

/// Words every supported server rejects, or misreads, as a bare column name
const RESERVED: &[&str] = &[
    "all", "alter", "and", "any", "as", "asc", "between", "both", "by", "case", "cast", "check",
    "collate", "column", "constraint", "create", "cross", "current_date", "current_time",
    "current_timestamp", "current_user", "default", "delete", "desc", "distinct", "drop", "else",
    "end", "except", "exists", "false", "fetch", "for", "foreign", "from", "full", "grant",
    "group", "having", "in", "index", "inner", "insert", "intersect", "into", "is", "join", "key",
    "left", "like", "limit", "natural", "not", "null", "offset", "on", "or", "order", "outer",
    "primary", "references", "right", "select", "session_user", "table", "then", "to", "true",
    "union", "unique", "update", "user", "using", "values", "when", "where", "with",
];

fn is_reserved(ident: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(ident))
}

/// How a Postgres column of a given type takes part in a row filter.
///
/// Types the driver binds natively compare with `=`. `json` has no `=`
/// operator and goes through `jsonb`. Everything else is read back in its
/// text form and compared as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PgBinding {
    Native,
    Json,
    AsText,
}

impl PgBinding {
    fn of(type_name: &str) -> Self {
        const NATIVE: [&str; 30] = [
            "", "bool", "boolean", "int2", "smallint", "int4", "int", "integer", "int8", "bigint",
            "oid", "float4", "real", "float8", "double precision", "numeric", "decimal", "jsonb",
            "uuid", "timestamp", "timestamptz", "date", "time", "bytea", "text", "varchar",
            "character varying", "bpchar", "name", "citext",
        ];
        let t = type_name.trim();
        if t.eq_ignore_ascii_case("json") {
            Self::Json
        } else if NATIVE.iter().any(|n| n.eq_ignore_ascii_case(t)) {
            Self::Native
        } else {
            Self::AsText
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
