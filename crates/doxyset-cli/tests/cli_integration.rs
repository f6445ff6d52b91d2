//! Integration tests for CLI behavior
//!
//! These run the built `doxysetutil` binary against temporary docset bundles
//! and check exit status, diagnostics, and the store left on disk.

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const NODES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DocSetNodes version="1.0">
  <TOC>
    <Node>
      <Name>Sample</Name>
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
      <TokenIdentifier>
        <Name>bar</Name>
        <APILanguage>cpp</APILanguage>
        <Type>instm</Type>
        <Scope>Foo</Scope>
      </TokenIdentifier>
      <Path>classFoo.html</Path>
      <Anchor>a1</Anchor>
      <DeclaredIn>foo.h</DeclaredIn>
    </Token>
    <Token>
      <TokenIdentifier>
        <Name>Foo</Name>
        <APILanguage>cpp</APILanguage>
        <Type>cl</Type>
      </TokenIdentifier>
      <Path>classFoo.html</Path>
    </Token>
  </File>
</Tokens>
"#;

/// Create `Sample.docset` with the given documents; `None` leaves a file out.
fn make_docset(dir: &TempDir, nodes: Option<&str>, tokens: Option<&str>) -> PathBuf {
    let docset = dir.path().join("Sample.docset");
    let resources = docset.join("Contents").join("Resources");
    fs::create_dir_all(&resources).expect("failed to create bundle");
    if let Some(nodes) = nodes {
        fs::write(resources.join("Nodes.xml"), nodes).expect("failed to write Nodes.xml");
    }
    if let Some(tokens) = tokens {
        fs::write(resources.join("Tokens.xml"), tokens).expect("failed to write Tokens.xml");
    }
    docset
}

fn store_path(docset: &Path) -> PathBuf {
    docset.join("Contents/Resources/docSet.dsidx")
}

fn run_doxysetutil(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_doxysetutil"))
        .args(args)
        .env_remove("DOXYSET_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run doxysetutil")
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn integration_help_lists_verbs() {
    let output = run_doxysetutil(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for verb in ["index", "search", "validate", "dump", "package"] {
        assert!(stdout.contains(verb), "help should mention {verb}");
    }
}

#[test]
fn integration_version_flag() {
    let output = run_doxysetutil(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("doxysetutil"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn integration_index_builds_store() {
    let dir = TempDir::new().unwrap();
    let docset = make_docset(&dir, Some(NODES), Some(TOKENS));

    let output = run_doxysetutil(&["index", docset.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stdout.is_empty(), "quiet run should print nothing");

    let conn = Connection::open(store_path(&docset)).unwrap();
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM ZTOKEN"), 2);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM ZNODE"), 3);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM ZORDEREDSUBNODE"), 2);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM searchIndex"), 2);
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM ZDOCSET d JOIN ZNODE n ON n.Z_PK = d.ZROOTNODE
             WHERE n.ZKNAME = 'Sample'"
        ),
        1
    );
}

#[test]
fn integration_verbose_prints_summary() {
    let dir = TempDir::new().unwrap();
    let docset = make_docset(&dir, Some(NODES), Some(TOKENS));

    let output = run_doxysetutil(&["index", "-v", docset.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tokens: 2"), "stdout: {stdout}");
    assert!(stdout.contains("complete"), "stdout: {stdout}");
}

#[test]
fn integration_missing_nodes_fails_without_store() {
    let dir = TempDir::new().unwrap();
    let docset = make_docset(&dir, None, Some(TOKENS));

    let output = run_doxysetutil(&["index", docset.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Nodes.xml"), "stderr: {stderr}");
    assert!(!store_path(&docset).exists());
}

#[test]
fn integration_malformed_tokens_fails() {
    let dir = TempDir::new().unwrap();
    let tokens = r#"<Tokens><Token><TokenIdentifier><Type>func</Type></TokenIdentifier></Token></Tokens>"#;
    let docset = make_docset(&dir, Some(NODES), Some(tokens));

    let output = run_doxysetutil(&["index", docset.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Tokens.xml"), "stderr: {stderr}");
    assert!(!store_path(&docset).exists());
}

#[test]
fn integration_unimplemented_verb_fails() {
    let output = run_doxysetutil(&["search", "Foo.docset", "NSString"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not implemented"), "stderr: {stderr}");
    assert!(stderr.contains("search"));
}

#[test]
fn integration_config_file_sets_version() {
    let dir = TempDir::new().unwrap();
    let docset = make_docset(&dir, Some(NODES), Some(TOKENS));
    let config = dir.path().join("doxyset.toml");
    fs::write(&config, "configuration_version = \"2.1\"\n").unwrap();

    let output = run_doxysetutil(&[
        "index",
        "--config",
        config.to_str().unwrap(),
        docset.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let conn = Connection::open(store_path(&docset)).unwrap();
    let version: String = conn
        .query_row("SELECT ZCONFIGURATIONVERSION FROM ZDOCSET", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(version, "2.1");
}

#[test]
fn integration_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let docset = make_docset(&dir, Some(NODES), Some(TOKENS));
    let config = dir.path().join("broken.toml");
    fs::write(&config, "root_policy = \"sideways\"\n").unwrap();

    let output = run_doxysetutil(&[
        "index",
        "--config",
        config.to_str().unwrap(),
        docset.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid config"), "stderr: {stderr}");
}

#[test]
fn integration_filter_flags_warn() {
    let dir = TempDir::new().unwrap();
    let docset = make_docset(&dir, Some(NODES), Some(TOKENS));

    let output = run_doxysetutil(&["index", "--skip-text", docset.to_str().unwrap()]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("skip-text"), "stderr: {stderr}");
}

#[test]
fn integration_deeply_nested_toc_indexes() {
    let dir = TempDir::new().unwrap();
    let depth: i64 = 20_000;
    let mut nodes = String::from("<DocSetNodes><TOC>");
    for i in 0..depth {
        nodes.push_str(&format!("<Node><Name>n{i}</Name><Path>n{i}.html</Path><Subnodes>"));
    }
    for _ in 0..depth {
        nodes.push_str("</Subnodes></Node>");
    }
    nodes.push_str("</TOC></DocSetNodes>");
    let docset = make_docset(&dir, Some(&nodes), Some(TOKENS));

    let output = run_doxysetutil(&["index", "-v", docset.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let conn = Connection::open(store_path(&docset)).unwrap();
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM ZNODE"), depth);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM ZORDEREDSUBNODE"), depth - 1);
}
