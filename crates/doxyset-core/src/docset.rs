//! Docset bundle layout and the `ZDOCSET` summary row.

use crate::config::RootPolicy;
use crate::error::{Document, Error, Result};
use crate::schema::entity;
use log::warn;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};

/// File locations inside a `.docset` bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsetPaths {
    pub index: PathBuf,
    pub nodes: PathBuf,
    pub tokens: PathBuf,
}

impl DocsetPaths {
    pub fn new(docset: &Path) -> Self {
        let resources = docset.join("Contents").join("Resources");
        Self {
            index: resources.join("docSet.dsidx"),
            nodes: resources.join("Nodes.xml"),
            tokens: resources.join("Tokens.xml"),
        }
    }
}

/// Pick the docset root among the top-level node ids, according to `policy`.
///
/// `None` means there is no top-level node and the root is written as NULL.
/// `toc_line` locates the diagnostic when the policy is violated.
pub fn select_root(top_level: &[i64], policy: RootPolicy, toc_line: u32) -> Result<Option<i64>> {
    if policy == RootPolicy::Single && top_level.len() != 1 {
        return Err(Error::malformed(
            Document::Nodes,
            "TOC",
            format!(
                "root policy 'single' requires exactly one top-level node, found {}",
                top_level.len()
            ),
            toc_line,
        ));
    }

    match top_level.len() {
        0 => {
            warn!("Nodes.xml has no top-level node; docset root left empty");
            Ok(None)
        }
        1 => Ok(top_level.first().copied()),
        n => {
            warn!(
                "Nodes.xml has {} top-level nodes; using the {} one as docset root",
                n, policy
            );
            Ok(match policy {
                RootPolicy::Last => top_level.last().copied(),
                RootPolicy::First | RootPolicy::Single => top_level.first().copied(),
            })
        }
    }
}

/// Insert the single `ZDOCSET` row and return its id.
pub fn finalize(
    conn: &Connection,
    root_node: Option<i64>,
    configuration_version: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO ZDOCSET (Z_ENT, Z_OPT, ZROOTNODE, ZCONFIGURATIONVERSION)
         VALUES (?1, 1, ?2, ?3)",
        params![entity::DOCSET, root_node, configuration_version],
    )?;
    Ok(conn.last_insert_rowid())
}
