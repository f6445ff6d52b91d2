//! Node tree builder: materializes the table of contents as `ZNODE`,
//! `ZNODEURL` and `ZORDEREDSUBNODE` rows.
//!
//! Nodes are inserted in pre-order, so a child's `ZPRIMARYPARENT` always
//! points at an existing row. The ordered link for a child is written once
//! the child's whole subtree is done, and a node's `ZKSUBNODECOUNT` is
//! patched once all of its children are done. Descent uses an explicit stack.

use crate::error::Result;
use crate::input::TocTree;
use crate::schema::entity;
use log::{Level, debug, log_enabled};
use rusqlite::{Connection, params};

/// Row counts produced by one or more subtree builds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeStats {
    pub nodes: usize,
    pub links: usize,
}

/// One node whose children are still being processed.
struct Frame {
    entry: usize,
    node_id: i64,
    /// Children handled so far; also the running sibling count.
    next_child: usize,
}

/// Insert the `ZNODEURL` and `ZNODE` rows for one entry and link them.
fn insert_node(
    conn: &Connection,
    tree: &TocTree,
    entry: usize,
    parent_id: Option<i64>,
) -> Result<i64> {
    let node = tree.node(entry);

    // ZCHECKSUM, ZBASEURL and ZFILENAME have no source; ZNODE is patched below.
    conn.execute(
        "INSERT INTO ZNODEURL
             (Z_ENT, Z_OPT, ZCHECKSUM, ZNODE, ZANCHOR, ZBASEURL, ZFILENAME, ZPATH)
         VALUES (?1, 1, NULL, NULL, ?2, NULL, NULL, ?3)",
        params![entity::NODE_URL, node.anchor, node.path],
    )?;
    let url_id = conn.last_insert_rowid();

    // ZKSUBNODECOUNT starts at 0 and is patched once the children are known.
    conn.execute(
        "INSERT INTO ZNODE
             (Z_ENT, Z_OPT, ZINSTALLDOMAIN, ZKDOCUMENTTYPE, ZKID, ZKISSEARCHABLE,
              ZKNODETYPE, ZKSUBNODECOUNT, ZPRIMARYPARENT, ZKNAME)
         VALUES (?1, 2, 1, 0, NULL, 1, 1, 0, ?2, ?3)",
        params![entity::NODE, parent_id, node.name],
    )?;
    let node_id = conn.last_insert_rowid();

    conn.execute(
        "UPDATE ZNODEURL SET ZNODE = ?1 WHERE Z_PK = ?2",
        params![node_id, url_id],
    )?;

    Ok(node_id)
}

/// `[i/n]` prefix per ancestor level, matching the position of the node being entered.
fn progress_prefix(tree: &TocTree, stack: &[Frame]) -> String {
    stack
        .iter()
        .map(|f| {
            format!(
                "[{}/{}]",
                f.next_child,
                tree.node(f.entry).children.len()
            )
        })
        .collect()
}

/// Build the subtree rooted at `root` under `parent_id` and return the root's node id.
pub(crate) fn build_subtree(
    conn: &Connection,
    tree: &TocTree,
    root: usize,
    parent_id: Option<i64>,
    stats: &mut NodeStats,
) -> Result<i64> {
    debug!("Processing {}", tree.node(root).name);
    let root_id = insert_node(conn, tree, root, parent_id)?;
    stats.nodes += 1;

    let mut stack = vec![Frame {
        entry: root,
        node_id: root_id,
        next_child: 0,
    }];

    loop {
        let Some(top) = stack.last_mut() else {
            // The root frame is only popped by the return below.
            return Ok(root_id);
        };
        let children = &tree.node(top.entry).children;

        if top.next_child < children.len() {
            let child = children[top.next_child];
            top.next_child += 1;
            let parent = top.node_id;

            if log_enabled!(Level::Debug) {
                debug!(
                    "{} Processing {}",
                    progress_prefix(tree, &stack),
                    tree.node(child).name
                );
            }

            let child_id = insert_node(conn, tree, child, Some(parent))?;
            stats.nodes += 1;
            stack.push(Frame {
                entry: child,
                node_id: child_id,
                next_child: 0,
            });
            continue;
        }

        // All children done: finalize this node, then link it into its parent.
        let Some(done) = stack.pop() else {
            return Ok(root_id);
        };
        conn.execute(
            "UPDATE ZNODE SET ZKSUBNODECOUNT = ?1 WHERE Z_PK = ?2",
            params![done.next_child as i64, done.node_id],
        )?;

        let Some(parent) = stack.last() else {
            return Ok(done.node_id);
        };
        conn.execute(
            "INSERT INTO ZORDEREDSUBNODE (Z_ENT, Z_OPT, ZORDER, ZNODE, ZPARENT)
             VALUES (?1, 1, ?2, ?3, ?4)",
            params![
                entity::ORDERED_SUBNODE,
                parent.next_child as i64,
                done.node_id,
                parent.node_id
            ],
        )?;
        stats.links += 1;
    }
}

/// Build every top-level node in document order. Returns their node ids in the same order.
pub fn build_tree(conn: &Connection, tree: &TocTree, stats: &mut NodeStats) -> Result<Vec<i64>> {
    tree.roots()
        .iter()
        .map(|&root| build_subtree(conn, tree, root, None, stats))
        .collect()
}
