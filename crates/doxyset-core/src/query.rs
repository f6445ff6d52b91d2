//! Read-only status report over a built store.

use crate::error::Result;
use rusqlite::{Connection, OpenFlags};
use std::fmt;
use std::path::Path;

/// Row counts of the tables an index run writes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub tokens: i64,
    pub meta_informations: i64,
    pub languages: i64,
    pub token_types: i64,
    pub containers: i64,
    pub file_paths: i64,
    pub headers: i64,
    pub nodes: i64,
    pub node_urls: i64,
    pub ordered_subnodes: i64,
    pub docsets: i64,
    /// Rows visible through the `searchIndex` view.
    pub searchable: i64,
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Index ({})\n  tokens: {}, searchable: {}, nodes: {}, links: {}\n  \
             languages: {}, types: {}, containers: {}, files: {}, headers: {}",
            if self.docsets == 0 { "empty" } else { "complete" },
            self.tokens,
            self.searchable,
            self.nodes,
            self.ordered_subnodes,
            self.languages,
            self.token_types,
            self.containers,
            self.file_paths,
            self.headers,
        )
    }
}

fn count(conn: &Connection, from: &str) -> Result<i64> {
    Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", from), [], |row| {
        row.get(0)
    })?)
}

/// Count rows in every table an index run writes.
pub fn index_status(conn: &Connection) -> Result<StoreStatus> {
    Ok(StoreStatus {
        tokens: count(conn, "ZTOKEN")?,
        meta_informations: count(conn, "ZTOKENMETAINFORMATION")?,
        languages: count(conn, "ZAPILANGUAGE")?,
        token_types: count(conn, "ZTOKENTYPE")?,
        containers: count(conn, "ZCONTAINER")?,
        file_paths: count(conn, "ZFILEPATH")?,
        headers: count(conn, "ZHEADER")?,
        nodes: count(conn, "ZNODE")?,
        node_urls: count(conn, "ZNODEURL")?,
        ordered_subnodes: count(conn, "ZORDEREDSUBNODE")?,
        docsets: count(conn, "ZDOCSET")?,
        searchable: count(conn, "searchIndex")?,
    })
}

/// Open a store read-only and report its status.
pub fn store_status(path: &Path) -> Result<StoreStatus> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    index_status(&conn)
}
