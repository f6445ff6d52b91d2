//! Loading and validation of the `Tokens.xml` and `Nodes.xml` documents.
//!
//! Both documents are parsed completely, and every required field checked,
//! before the store is touched. A run therefore never writes a row for input
//! that later turns out to be malformed.
//!
//! Parsing is a single pass over pull-parser events with explicit element
//! stacks, so nesting depth costs heap, not native stack.

use crate::error::{Document, Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs;
use std::path::Path;

/// One `Token` element of `Tokens.xml`.
///
/// Every field except `name` defaults to the empty string when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRecord {
    pub name: String,
    pub language: String,
    pub kind: String,
    pub scope: String,
    pub declared_in: String,
    pub path: String,
    pub anchor: String,
    pub abstract_text: String,
}

/// One `Node` element of `Nodes.xml`. Children are indices into the owning [`TocTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocEntry {
    pub name: String,
    pub path: String,
    pub anchor: String,
    pub children: Vec<usize>,
}

/// Table of contents stored as an arena in pre-order; `roots` are the top-level nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocTree {
    entries: Vec<TocEntry>,
    roots: Vec<usize>,
    toc_line: u32,
}

impl TocTree {
    pub fn entry(&self, index: usize) -> Option<&TocEntry> {
        self.entries.get(index)
    }

    /// Entry for an index handed out by this tree.
    pub(crate) fn node(&self, index: usize) -> &TocEntry {
        &self.entries[index]
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Total number of nodes at every depth.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Line of the `TOC` element (or the document element when there is none).
    pub fn toc_line(&self) -> u32 {
        self.toc_line
    }

    /// Append an entry under `parent` (or as a new top-level node) and return its index.
    pub(crate) fn push(&mut self, parent: Option<usize>, name: &str, path: &str, anchor: &str) -> usize {
        let index = self.entries.len();
        self.entries.push(TocEntry {
            name: name.to_string(),
            path: path.to_string(),
            anchor: anchor.to_string(),
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.entries[p].children.push(index),
            None => self.roots.push(index),
        }
        index
    }

    fn fill(&mut self, index: usize, name: String, path: String, anchor: String) {
        let entry = &mut self.entries[index];
        entry.name = name;
        entry.path = path;
        entry.anchor = anchor;
    }
}

/// Read an input document, mapping any failure to `MissingInput`.
pub fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::MissingInput {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_tokens(path: &Path) -> Result<Vec<TokenRecord>> {
    parse_tokens(&read_document(path)?)
}

pub fn load_nodes(path: &Path) -> Result<TocTree> {
    parse_nodes(&read_document(path)?)
}

/// Maps byte offsets to 1-based line numbers. Offsets must not decrease.
struct LineCounter<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: u32,
}

impl<'a> LineCounter<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, pos: impl TryInto<usize>) -> u32 {
        let pos = pos
            .try_into()
            .map_or(self.bytes.len(), |p| p.min(self.bytes.len()));
        if pos > self.offset {
            let newlines = self.bytes[self.offset..pos]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.line = self
                .line
                .saturating_add(u32::try_from(newlines).unwrap_or(u32::MAX));
            self.offset = pos;
        }
        self.line
    }
}

enum XmlEvent {
    Start(String),
    End,
    Text(String),
}

/// Element-level event stream over one document.
struct XmlStream<'a> {
    reader: Reader<&'a [u8]>,
    lines: LineCounter<'a>,
    document: Document,
    depth: usize,
    seen_root: bool,
}

impl<'a> XmlStream<'a> {
    fn new(text: &'a str, document: Document) -> Self {
        let mut reader = Reader::from_str(text);
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            lines: LineCounter::new(text),
            document,
            depth: 0,
            seen_root: false,
        }
    }

    fn line(&mut self) -> u32 {
        let pos = self.reader.buffer_position();
        self.lines.line_at(pos)
    }

    fn malformed(&self, message: impl Into<String>, line: u32) -> Error {
        Error::malformed(self.document, "document", message, line)
    }

    /// Next element or text event with the line it starts on; `None` at end of document.
    fn next_event(&mut self) -> Result<Option<(XmlEvent, u32)>> {
        loop {
            let line = self.line();
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    let line = self.line();
                    return Err(self.malformed(e.to_string(), line));
                }
            };

            match event {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    self.depth += 1;
                    self.seen_root = true;
                    return Ok(Some((XmlEvent::Start(name), line)));
                }
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    return Ok(Some((XmlEvent::End, line)));
                }
                Event::Text(e) if self.depth > 0 => {
                    let text = e
                        .unescape()
                        .map_err(|err| self.malformed(err.to_string(), line))?;
                    return Ok(Some((XmlEvent::Text(text.into_owned()), line)));
                }
                Event::CData(e) if self.depth > 0 => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    return Ok(Some((XmlEvent::Text(text), line)));
                }
                Event::Eof => {
                    if self.depth > 0 {
                        return Err(self.malformed("unexpected end of document: unclosed element", line));
                    }
                    if !self.seen_root {
                        return Err(self.malformed("document has no root element", line));
                    }
                    return Ok(None);
                }
                // Declaration, DOCTYPE, comments, processing instructions, whitespace outside the root.
                _ => {}
            }
        }
    }
}

/// Collects the text of the first element found at each of `paths`, relative to a record element.
struct FieldCapture {
    paths: &'static [&'static [&'static str]],
    values: Vec<Option<String>>,
    /// Field being captured and the depth of its element.
    active: Option<(usize, usize)>,
}

impl FieldCapture {
    fn new(paths: &'static [&'static [&'static str]]) -> Self {
        Self {
            paths,
            values: vec![None; paths.len()],
            active: None,
        }
    }

    fn start(&mut self, relative: &[String], depth: usize) {
        if self.active.is_some() {
            return;
        }
        let matched = self
            .paths
            .iter()
            .position(|p| p.iter().copied().eq(relative.iter().map(String::as_str)));
        if let Some(i) = matched
            && self.values[i].is_none()
        {
            self.values[i] = Some(String::new());
            self.active = Some((i, depth));
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((i, _)) = self.active
            && let Some(value) = self.values[i].as_mut()
        {
            value.push_str(text);
        }
    }

    fn end(&mut self, depth: usize) {
        if self.active.is_some_and(|(_, d)| d == depth) {
            self.active = None;
        }
    }

    /// Trimmed text of field `i`, if its element was present.
    fn take(&mut self, i: usize) -> Option<String> {
        self.values[i].take().map(|v| v.trim().to_string())
    }
}

const TOKEN_FIELDS: &[&[&str]] = &[
    &["TokenIdentifier", "Name"],
    &["TokenIdentifier", "APILanguage"],
    &["TokenIdentifier", "Type"],
    &["TokenIdentifier", "Scope"],
    &["DeclaredIn"],
    &["Path"],
    &["Anchor"],
    &["Abstract"],
];

struct OpenToken {
    depth: usize,
    index: usize,
    line: u32,
    fields: FieldCapture,
}

impl OpenToken {
    fn finish(mut self) -> Result<TokenRecord> {
        let (index, line) = (self.index, self.line);
        let f = &mut self.fields;
        let name = f.take(0).filter(|name| !name.is_empty()).ok_or_else(|| {
            Error::malformed(
                Document::Tokens,
                format!("token #{}", index + 1),
                "missing or empty TokenIdentifier/Name",
                line,
            )
        })?;

        Ok(TokenRecord {
            name,
            language: f.take(1).unwrap_or_default(),
            kind: f.take(2).unwrap_or_default(),
            scope: f.take(3).unwrap_or_default(),
            declared_in: f.take(4).unwrap_or_default(),
            path: f.take(5).unwrap_or_default(),
            anchor: f.take(6).unwrap_or_default(),
            abstract_text: f.take(7).unwrap_or_default(),
        })
    }
}

/// Parse `Tokens.xml`: every `Token` element anywhere in the document, in document order.
pub fn parse_tokens(text: &str) -> Result<Vec<TokenRecord>> {
    let mut xml = XmlStream::new(text, Document::Tokens);
    let mut names: Vec<String> = Vec::new();
    let mut open: Vec<OpenToken> = Vec::new();
    let mut tokens = Vec::new();

    while let Some((event, line)) = xml.next_event()? {
        match event {
            XmlEvent::Start(name) => {
                names.push(name);
                let depth = names.len();
                if let Some(token) = open.last_mut() {
                    token.fields.start(&names[token.depth..], depth);
                }
                if names[depth - 1] == "Token" {
                    // Slot reserved at the start tag keeps document order for nested tokens.
                    tokens.push(TokenRecord::default());
                    open.push(OpenToken {
                        depth,
                        index: tokens.len() - 1,
                        line,
                        fields: FieldCapture::new(TOKEN_FIELDS),
                    });
                }
            }
            XmlEvent::Text(text) => {
                if let Some(token) = open.last_mut() {
                    token.fields.text(&text);
                }
            }
            XmlEvent::End => {
                let depth = names.len();
                if let Some(token) = open.last_mut() {
                    token.fields.end(depth);
                }
                if let Some(token) = open.pop_if(|t| t.depth == depth) {
                    let index = token.index;
                    tokens[index] = token.finish()?;
                }
                names.pop();
            }
        }
    }

    Ok(tokens)
}

const NODE_FIELDS: &[&[&str]] = &[&["Name"], &["Path"], &["Anchor"]];

struct OpenNode {
    depth: usize,
    index: usize,
    /// 1-based position among its siblings.
    ordinal: usize,
    children: usize,
    /// Depth of the open `Subnodes` container whose `Node` children belong to this node.
    subnodes: Option<usize>,
    subnodes_seen: bool,
    line: u32,
    fields: FieldCapture,
}

/// Positional locator such as `node 1.3.2`, built only when a diagnostic needs it.
fn node_locator(ancestors: &[OpenNode], ordinal: usize) -> String {
    let mut locator = String::from("node ");
    for node in ancestors {
        locator.push_str(&node.ordinal.to_string());
        locator.push('.');
    }
    locator.push_str(&ordinal.to_string());
    locator
}

fn finish_node(tree: &mut TocTree, ancestors: &[OpenNode], mut node: OpenNode) -> Result<()> {
    let name = node.fields.take(0);
    let path = node.fields.take(1);
    let anchor = node.fields.take(2).unwrap_or_default();

    let (ordinal, line) = (node.ordinal, node.line);
    let missing = |what: &str| {
        Error::malformed(Document::Nodes, node_locator(ancestors, ordinal), what, line)
    };
    let name = name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| missing("missing or empty Name"))?;
    let path = path.ok_or_else(|| missing("missing Path"))?;

    tree.fill(node.index, name, path, anchor);
    Ok(())
}

/// Parse `Nodes.xml`: top-level nodes are `/DocSetNodes/TOC/Node`, children
/// live under `Subnodes/Node`. Only the first `TOC`, and the first `Subnodes`
/// of each node, are read.
pub fn parse_nodes(text: &str) -> Result<TocTree> {
    let mut xml = XmlStream::new(text, Document::Nodes);
    let mut tree = TocTree::default();
    let mut names: Vec<String> = Vec::new();
    let mut open: Vec<OpenNode> = Vec::new();
    let mut toc: Option<usize> = None;
    let mut toc_seen = false;
    let mut top_level = 0;

    while let Some((event, line)) = xml.next_event()? {
        match event {
            XmlEvent::Start(name) => {
                names.push(name);
                let depth = names.len();
                let element = names[depth - 1].as_str();

                if depth == 1 {
                    if element != "DocSetNodes" {
                        return Err(Error::malformed(
                            Document::Nodes,
                            "document",
                            format!("expected DocSetNodes root element, found {}", element),
                            line,
                        ));
                    }
                    tree.toc_line = line;
                    continue;
                }

                if let Some(node) = open.last_mut() {
                    node.fields.start(&names[node.depth..], depth);
                }

                if depth == 2 && element == "TOC" && !toc_seen {
                    toc_seen = true;
                    toc = Some(depth);
                    tree.toc_line = line;
                } else if element == "Subnodes" {
                    if let Some(node) = open.last_mut()
                        && node.depth + 1 == depth
                        && !node.subnodes_seen
                    {
                        node.subnodes_seen = true;
                        node.subnodes = Some(depth);
                    }
                } else if element == "Node" {
                    let placement = match open.last_mut() {
                        Some(parent) if parent.subnodes == Some(depth - 1) => {
                            parent.children += 1;
                            Some((Some(parent.index), parent.children))
                        }
                        Some(_) => None,
                        None if toc == Some(depth - 1) => {
                            top_level += 1;
                            Some((None, top_level))
                        }
                        None => None,
                    };
                    if let Some((parent, ordinal)) = placement {
                        let index = tree.push(parent, "", "", "");
                        open.push(OpenNode {
                            depth,
                            index,
                            ordinal,
                            children: 0,
                            subnodes: None,
                            subnodes_seen: false,
                            line,
                            fields: FieldCapture::new(NODE_FIELDS),
                        });
                    }
                }
            }
            XmlEvent::Text(text) => {
                if let Some(node) = open.last_mut() {
                    node.fields.text(&text);
                }
            }
            XmlEvent::End => {
                let depth = names.len();
                if let Some(node) = open.last_mut() {
                    node.fields.end(depth);
                    if node.subnodes == Some(depth) {
                        node.subnodes = None;
                    }
                }
                if toc == Some(depth) {
                    toc = None;
                }
                if let Some(node) = open.pop_if(|n| n.depth == depth) {
                    finish_node(&mut tree, &open, node)?;
                }
                names.pop();
            }
        }
    }

    Ok(tree)
}
