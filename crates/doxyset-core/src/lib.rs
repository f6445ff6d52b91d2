//! doxyset-core: builds a docset's `docSet.dsidx` search index.
//!
//! Converts a docset's `Tokens.xml` (flat symbol list) and `Nodes.xml`
//! (table of contents) into the SQLite store documentation browsers expect,
//! using the same frozen schema as Apple's `docsetutil`.
//!
//! ```no_run
//! use doxyset_core::{DocsetPaths, IndexConfig, build_index};
//! use std::path::Path;
//!
//! fn main() -> doxyset_core::Result<()> {
//!     let paths = DocsetPaths::new(Path::new("Foo.docset"));
//!     let stats = build_index(&paths, &IndexConfig::default())?;
//!     println!("{stats}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod docset;
pub mod error;
pub mod indexer;
pub mod input;
pub mod lookup;
pub mod nodes;
pub mod query;
pub mod schema;
pub mod tokens;

pub use config::{IndexConfig, IndexConfigOverride, RootPolicy};
pub use docset::DocsetPaths;
pub use error::{Document, Error, Result};
pub use indexer::{IndexStats, build_index, index_documents};
pub use input::{TocEntry, TocTree, TokenRecord};
pub use lookup::{LookupCache, LookupCategory};
pub use query::{StoreStatus, index_status, store_status};
