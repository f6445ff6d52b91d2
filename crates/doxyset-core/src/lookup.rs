//! Per-run deduplication cache for the lookup tables.
//!
//! Languages, token types, containers, file paths and headers are each
//! stored once per distinct name. The cache remembers the row id assigned to
//! every `(category, name)` pair so repeated values never touch the store.

use crate::error::Result;
use crate::schema::entity;
use log::debug;
use rusqlite::{Connection, params};
use std::collections::HashMap;
use std::fmt;

/// The deduplicated lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupCategory {
    Language,
    TokenType,
    Container,
    FilePath,
    Header,
}

impl LookupCategory {
    pub const ALL: [LookupCategory; 5] = [
        LookupCategory::Language,
        LookupCategory::TokenType,
        LookupCategory::Container,
        LookupCategory::FilePath,
        LookupCategory::Header,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            LookupCategory::Language => "ZAPILANGUAGE",
            LookupCategory::TokenType => "ZTOKENTYPE",
            LookupCategory::Container => "ZCONTAINER",
            LookupCategory::FilePath => "ZFILEPATH",
            LookupCategory::Header => "ZHEADER",
        }
    }

    /// Column holding the deduplicated name.
    pub fn name_column(&self) -> &'static str {
        match self {
            LookupCategory::Language => "ZFULLNAME",
            LookupCategory::TokenType => "ZTYPENAME",
            LookupCategory::Container => "ZCONTAINERNAME",
            LookupCategory::FilePath => "ZPATH",
            LookupCategory::Header => "ZHEADERPATH",
        }
    }

    fn entity(&self) -> i64 {
        match self {
            LookupCategory::Language => entity::API_LANGUAGE,
            LookupCategory::TokenType => entity::TOKEN_TYPE,
            LookupCategory::Container => entity::CONTAINER,
            LookupCategory::FilePath => entity::FILE_PATH,
            LookupCategory::Header => entity::HEADER,
        }
    }

    // ZHEADER also carries ZFRAMEWORKNAME, which nothing in the input provides;
    // it is left NULL by omission.
    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (Z_ENT, Z_OPT, {}) VALUES (?1, 1, ?2)",
            self.table(),
            self.name_column()
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupCategory::Language => "language",
            LookupCategory::TokenType => "token type",
            LookupCategory::Container => "container",
            LookupCategory::FilePath => "file path",
            LookupCategory::Header => "header",
        }
    }
}

impl fmt::Display for LookupCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps `(category, name)` to the row id assigned during this run.
#[derive(Debug, Default)]
pub struct LookupCache {
    ids: HashMap<LookupCategory, HashMap<String, i64>>,
    hits: u64,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the row id for `name` under `category`, inserting the row on first sight.
    pub fn resolve(
        &mut self,
        conn: &Connection,
        category: LookupCategory,
        name: &str,
    ) -> Result<i64> {
        let names = self.ids.entry(category).or_default();
        if let Some(&id) = names.get(name) {
            self.hits += 1;
            return Ok(id);
        }

        conn.execute(&category.insert_sql(), params![category.entity(), name])?;
        let id = conn.last_insert_rowid();
        names.insert(name.to_string(), id);
        debug!("new {} {:?} -> {}", category, name, id);
        Ok(id)
    }

    /// Already-assigned id, without inserting.
    pub fn get(&self, category: LookupCategory, name: &str) -> Option<i64> {
        self.ids.get(&category)?.get(name).copied()
    }

    /// Number of distinct rows inserted for `category`.
    pub fn len(&self, category: LookupCategory) -> usize {
        self.ids.get(&category).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.values().all(HashMap::is_empty)
    }

    /// Resolutions answered without touching the store.
    pub fn hits(&self) -> u64 {
        self.hits
    }
}
