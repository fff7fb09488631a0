//! Saved-query library
//!
//! Named SQL queries per connection, addressable by numeric id or by name.

use crate::config::ConfigFile;
use crate::config::connections::ConnectionConfig;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Id of a query that has not been saved yet
pub const UNSAVED_ID: i64 = -1;

/// A saved (or inline, when `id == -1`) query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub name: String,
    #[serde(default = "unsaved_id")]
    pub id: i64,
    pub sql: String,
    /// Table the results come from, when known
    #[serde(default, rename = "table", skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
}

fn unsaved_id() -> i64 {
    UNSAVED_ID
}

impl SavedQuery {
    /// An unsaved query wrapping ad-hoc SQL
    pub fn inline(sql: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            id: UNSAVED_ID,
            sql: sql.into(),
            table_name: None,
            primary_key: None,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id > 0
    }
}

/// How a user refers to a saved query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(i64),
    Name(String),
}

impl Selector {
    /// Decimal digits select by id, anything else by name
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && let Ok(id) = s.parse()
        {
            return Selector::Id(id);
        }
        Selector::Name(s.to_string())
    }

    pub fn matches(&self, query: &SavedQuery) -> bool {
        match self {
            Selector::Id(id) => query.id == *id,
            Selector::Name(name) => query.name == *name,
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "{}", id),
            Selector::Name(name) => f.write_str(name),
        }
    }
}

/// Storage for saved queries of one connection
pub trait QueryLibrary {
    /// Look a query up by id or name
    fn find(&self, selector: &Selector) -> Option<SavedQuery>;

    /// Persist a new query, assigning an id when it has none
    ///
    /// # Errors
    /// Returns `ConfigError::DuplicateQuery` when the name is taken
    fn save(&mut self, query: SavedQuery) -> ConfigResult<SavedQuery>;

    /// Remember `query` as the last one run
    fn record_last(&mut self, query: &SavedQuery) -> ConfigResult<()>;
}

/// Shared id assignment and collision check
fn insert_query(queries: &mut Vec<SavedQuery>, mut query: SavedQuery) -> ConfigResult<SavedQuery> {
    let name = query.name.trim().to_string();
    if name.is_empty() {
        return Err(ConfigError::Invalid("Saved query needs a name".into()));
    }
    if name.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::Invalid(format!(
            "'{}' would be read as an id; pick a name with letters",
            name
        )));
    }
    if queries.iter().any(|q| q.name == name) {
        return Err(ConfigError::DuplicateQuery(name));
    }
    query.name = name;
    if query.id == UNSAVED_ID {
        query.id = queries.iter().map(|q| q.id).max().unwrap_or(0).max(0) + 1;
    } else if query.id <= 0 || queries.iter().any(|q| q.id == query.id) {
        return Err(ConfigError::Invalid(format!("Query id {} is not available", query.id)));
    }
    queries.push(query.clone());
    Ok(query)
}

/// Library kept only in memory (ad-hoc connections, tests)
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    pub queries: Vec<SavedQuery>,
    pub last: Option<SavedQuery>,
}

impl QueryLibrary for InMemoryLibrary {
    fn find(&self, selector: &Selector) -> Option<SavedQuery> {
        self.queries.iter().find(|q| selector.matches(q)).cloned()
    }

    fn save(&mut self, query: SavedQuery) -> ConfigResult<SavedQuery> {
        insert_query(&mut self.queries, query)
    }

    fn record_last(&mut self, query: &SavedQuery) -> ConfigResult<()> {
        self.last = Some(query.clone());
        Ok(())
    }
}

/// Library backed by one connection entry of the config file.
///
/// Every change rewrites the whole file atomically.
#[derive(Debug)]
pub struct FileLibrary {
    path: PathBuf,
    connection: String,
    file: ConfigFile,
}

impl FileLibrary {
    pub fn open(path: PathBuf, connection: &str) -> ConfigResult<Self> {
        let file = ConfigFile::load_from(&path)?;
        file.connection(connection)?;
        Ok(Self {
            path,
            connection: connection.to_string(),
            file,
        })
    }

    /// SQL last run on this connection
    pub fn last_query(&self) -> Option<String> {
        self.entry().ok().and_then(|c| c.last_query.clone())
    }

    fn entry(&self) -> ConfigResult<&ConnectionConfig> {
        self.file.connection(&self.connection)
    }

    fn entry_mut(&mut self) -> ConfigResult<&mut ConnectionConfig> {
        let name = self.connection.clone();
        self.file
            .connections
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or(ConfigError::ProfileNotFound(name))
    }
}

impl QueryLibrary for FileLibrary {
    fn find(&self, selector: &Selector) -> Option<SavedQuery> {
        self.entry()
            .ok()?
            .queries
            .iter()
            .find(|q| selector.matches(q))
            .cloned()
    }

    fn save(&mut self, query: SavedQuery) -> ConfigResult<SavedQuery> {
        let saved = insert_query(&mut self.entry_mut()?.queries, query)?;
        self.file.save_to(&self.path)?;
        tracing::info!(name = %saved.name, id = saved.id, "saved query");
        Ok(saved)
    }

    fn record_last(&mut self, query: &SavedQuery) -> ConfigResult<()> {
        self.entry_mut()?.last_query = Some(query.sql.clone());
        self.file.save_to(&self.path)
    }
}
