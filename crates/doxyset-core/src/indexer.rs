//! Index run orchestration.
//!
//! Reads and validates both input documents, recreates the store, writes
//! tokens, nodes and the docset summary inside one transaction, and removes
//! the store again if anything fails after it was created.

use crate::config::IndexConfig;
use crate::docset::{self, DocsetPaths};
use crate::error::{Error, Result};
use crate::input::{self, TocTree, TokenRecord};
use crate::lookup::{LookupCache, LookupCategory};
use crate::nodes::{self, NodeStats};
use crate::schema;
use crate::tokens;
use log::{info, warn};
use rusqlite::Connection;
use std::fmt;

/// Statistics returned after an index run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub tokens: usize,
    pub languages: usize,
    pub token_types: usize,
    pub containers: usize,
    pub file_paths: usize,
    pub headers: usize,
    /// Lookup resolutions served from the cache.
    pub lookup_hits: u64,
    pub nodes: usize,
    pub links: usize,
    pub top_level_nodes: usize,
    pub root_node: Option<i64>,
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tokens: {}, languages: {}, types: {}, containers: {}, files: {}, headers: {}, \
             cache hits: {}, nodes: {}, links: {}, top-level: {}, root: {}",
            self.tokens,
            self.languages,
            self.token_types,
            self.containers,
            self.file_paths,
            self.headers,
            self.lookup_hits,
            self.nodes,
            self.links,
            self.top_level_nodes,
            self.root_node
                .map_or_else(|| "none".to_string(), |id| id.to_string()),
        )
    }
}

/// Write parsed documents into an initialized store.
///
/// Tokens first, then the node tree, then the summary row. The caller owns
/// transaction handling.
pub fn index_documents(
    conn: &Connection,
    tokens: &[TokenRecord],
    toc: &TocTree,
    config: &IndexConfig,
) -> Result<IndexStats> {
    let mut stats = IndexStats::default();

    info!("Processing {} tokens...", tokens.len());
    let mut cache = LookupCache::new();
    stats.tokens = tokens::index_tokens(conn, &mut cache, tokens)?;
    stats.languages = cache.len(LookupCategory::Language);
    stats.token_types = cache.len(LookupCategory::TokenType);
    stats.containers = cache.len(LookupCategory::Container);
    stats.file_paths = cache.len(LookupCategory::FilePath);
    stats.headers = cache.len(LookupCategory::Header);
    stats.lookup_hits = cache.hits();
    drop(cache);

    info!("Processing {} nodes...", toc.len());
    let mut node_stats = NodeStats::default();
    let top_level = nodes::build_tree(conn, toc, &mut node_stats)?;
    stats.nodes = node_stats.nodes;
    stats.links = node_stats.links;
    stats.top_level_nodes = top_level.len();

    stats.root_node = docset::select_root(&top_level, config.root_policy, toc.toc_line())?;
    docset::finalize(conn, stats.root_node, &config.configuration_version)?;

    Ok(stats)
}

fn write_store(
    mut conn: Connection,
    tokens: &[TokenRecord],
    toc: &TocTree,
    config: &IndexConfig,
) -> Result<IndexStats> {
    let tx = conn.transaction()?;
    let stats = index_documents(&tx, tokens, toc, config)?;
    tx.commit()?;
    conn.close().map_err(|(_, e)| Error::StoreWrite(e))?;
    Ok(stats)
}

/// Convert a docset's `Tokens.xml` and `Nodes.xml` into `docSet.dsidx`.
///
/// Missing or malformed input is reported before the existing store is
/// touched. Any failure afterwards leaves no store file behind.
pub fn build_index(paths: &DocsetPaths, config: &IndexConfig) -> Result<IndexStats> {
    let inert = config.inert_filters();
    if !inert.is_empty() {
        warn!(
            "filter options are accepted but not applied: {}",
            inert.join(", ")
        );
    }

    info!(
        "Creating index {} from {} and {}",
        paths.index.display(),
        paths.nodes.display(),
        paths.tokens.display()
    );

    let nodes_text = input::read_document(&paths.nodes)?;
    let tokens_text = input::read_document(&paths.tokens)?;
    let toc = input::parse_nodes(&nodes_text)?;
    let tokens = input::parse_tokens(&tokens_text)?;

    let result = schema::initialize(&paths.index)
        .and_then(|conn| write_store(conn, &tokens, &toc, config));

    if result.is_err()
        && let Err(e) = schema::remove_store(&paths.index)
    {
        warn!("failed to remove incomplete store: {}", e);
    }

    let stats = result?;
    info!("Index complete: {}", stats);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RootPolicy;
    use std::fs;
    use tempfile::TempDir;

    const NODES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DocSetNodes version="1.0">
  <TOC>
    <Node>
      <Name>Root</Name>
      <Path>index.html</Path>
      <Subnodes>
        <Node><Name>Classes</Name><Path>annotated.html</Path></Node>
        <Node><Name>Files</Name><Path>files.html</Path></Node>
      </Subnodes>
    </Node>
  </TOC>
</DocSetNodes>
"#;

    const TOKENS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Tokens version="1.0">
  <File path="classFoo.html">
    <Token>
      <TokenIdentifier><Name>Foo</Name><APILanguage>cpp</APILanguage><Type>cl</Type></TokenIdentifier>
      <Path>classFoo.html</Path>
      <DeclaredIn>foo.h</DeclaredIn>
    </Token>
    <Token>
      <TokenIdentifier><Name>bar</Name><APILanguage>cpp</APILanguage><Type>instm</Type><Scope>Foo</Scope></TokenIdentifier>
      <Path>classFoo.html</Path>
      <Anchor>a1</Anchor>
      <DeclaredIn>foo.h</DeclaredIn>
    </Token>
  </File>
</Tokens>
"#;

    fn write_docset(dir: &TempDir, nodes: Option<&str>, tokens: Option<&str>) -> DocsetPaths {
        let docset = dir.path().join("Test.docset");
        let paths = DocsetPaths::new(&docset);
        fs::create_dir_all(paths.index.parent().unwrap()).unwrap();
        if let Some(nodes) = nodes {
            fs::write(&paths.nodes, nodes).unwrap();
        }
        if let Some(tokens) = tokens {
            fs::write(&paths.tokens, tokens).unwrap();
        }
        paths
    }

    #[test]
    fn build_index_reports_stats() {
        let dir = TempDir::new().unwrap();
        let paths = write_docset(&dir, Some(NODES), Some(TOKENS));

        let stats = build_index(&paths, &IndexConfig::default()).unwrap();
        assert_eq!(stats.tokens, 2);
        assert_eq!(stats.languages, 1);
        assert_eq!(stats.token_types, 2);
        assert_eq!(stats.containers, 2); // "" and "Foo"
        assert_eq!(stats.file_paths, 1);
        assert_eq!(stats.headers, 1);
        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.links, 2);
        assert_eq!(stats.top_level_nodes, 1);
        assert!(stats.root_node.is_some());
        assert!(paths.index.exists());
    }

    #[test]
    fn missing_input_leaves_existing_store_untouched() {
        let dir = TempDir::new().unwrap();
        let paths = write_docset(&dir, Some(NODES), None);
        fs::write(&paths.index, b"previous").unwrap();

        let err = build_index(&paths, &IndexConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
        assert_eq!(fs::read(&paths.index).unwrap(), b"previous");
    }

    #[test]
    fn malformed_input_is_detected_before_store_creation() {
        let dir = TempDir::new().unwrap();
        let bad_tokens = "<Tokens><Token><TokenIdentifier><Type>func</Type></TokenIdentifier></Token></Tokens>";
        let paths = write_docset(&dir, Some(NODES), Some(bad_tokens));

        let err = build_index(&paths, &IndexConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
        assert!(!paths.index.exists());
    }

    #[test]
    fn failure_after_store_creation_removes_store() {
        let dir = TempDir::new().unwrap();
        let two_roots = r#"<DocSetNodes>
<TOC>
<Node><Name>A</Name><Path>a.html</Path></Node>
<Node><Name>B</Name><Path>b.html</Path></Node>
</TOC></DocSetNodes>"#;
        let paths = write_docset(&dir, Some(two_roots), Some(TOKENS));
        let config = IndexConfig {
            root_policy: RootPolicy::Single,
            ..Default::default()
        };

        let err = build_index(&paths, &config).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { line: 2, .. }));
        assert!(err.to_string().contains("Nodes.xml at line 2"));
        assert!(!paths.index.exists());
    }

    #[test]
    fn deeply_nested_nodes_index_end_to_end() {
        let dir = TempDir::new().unwrap();
        let depth = 20_000;
        let mut nodes = String::from("<DocSetNodes><TOC>");
        for i in 0..depth {
            nodes.push_str(&format!("<Node><Name>n{i}</Name><Path>n{i}.html</Path><Subnodes>"));
        }
        for _ in 0..depth {
            nodes.push_str("</Subnodes></Node>");
        }
        nodes.push_str("</TOC></DocSetNodes>");
        let paths = write_docset(&dir, Some(&nodes), Some(TOKENS));

        let stats = build_index(&paths, &IndexConfig::default()).unwrap();
        assert_eq!(stats.nodes, depth);
        assert_eq!(stats.links, depth - 1);
        assert_eq!(stats.top_level_nodes, 1);
    }

    #[test]
    fn index_documents_uses_configured_version() {
        let dir = TempDir::new().unwrap();
        let conn = schema::initialize(&dir.path().join("docSet.dsidx")).unwrap();
        let config = IndexConfig {
            configuration_version: "2.0".to_string(),
            ..Default::default()
        };

        let toc = input::parse_nodes(NODES).unwrap();
        let tokens = input::parse_tokens(TOKENS).unwrap();
        let stats = index_documents(&conn, &tokens, &toc, &config).unwrap();

        let (root, version): (i64, String) = conn
            .query_row(
                "SELECT ZROOTNODE, ZCONFIGURATIONVERSION FROM ZDOCSET",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(Some(root), stats.root_node);
        assert_eq!(version, "2.0");
    }

    #[test]
    fn stats_display_lists_counts() {
        let stats = IndexStats {
            tokens: 5,
            nodes: 3,
            root_node: Some(1),
            ..Default::default()
        };
        let display = stats.to_string();
        assert!(display.contains("tokens: 5"));
        assert!(display.contains("nodes: 3"));
        assert!(display.contains("root: 1"));
        assert!(IndexStats::default().to_string().contains("root: none"));
    }
}
