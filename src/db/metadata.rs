//! Table metadata
//!
//! What `DatabaseHandle::table_metadata` reports about a single table.

/// A foreign key from one local column to a referenced column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Columns, types and keys of a table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMetadata {
    /// Column names in ordinal order
    pub columns: Vec<String>,
    /// Type names, parallel to `columns`
    pub column_types: Vec<String>,
    /// Primary key columns in key order
    pub primary_keys: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableMetadata {
    /// The primary key column when the key is a single column
    pub fn single_primary_key(&self) -> Option<&str> {
        match self.primary_keys.as_slice() {
            [pk] => Some(pk.as_str()),
            _ => None,
        }
    }

    pub fn foreign_key_for(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }
}
