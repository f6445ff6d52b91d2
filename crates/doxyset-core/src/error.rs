//! Error taxonomy for an index run.
//!
//! Every variant is fatal: a run is a one-shot batch conversion, so the first
//! error aborts it and nothing is retried.

use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Which input document a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    Tokens,
    Nodes,
}

impl Document {
    pub fn as_str(&self) -> &'static str {
        match self {
            Document::Tokens => "Tokens.xml",
            Document::Nodes => "Nodes.xml",
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An input document is absent or unreadable.
    #[error("missing input {}: {source}", path.display())]
    MissingInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A required field is absent, or the document is not well-formed XML.
    #[error("malformed {document} at line {line}: {record}: {message}")]
    MalformedInput {
        document: Document,
        /// Human-readable locator of the failing record (token index or node path).
        record: String,
        message: String,
        line: u32,
    },

    /// The store rejected a write.
    #[error("store write failed: {0}")]
    StoreWrite(#[from] rusqlite::Error),

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn malformed(
        document: Document,
        record: impl Into<String>,
        message: impl Into<String>,
        line: u32,
    ) -> Self {
        Error::MalformedInput {
            document,
            record: record.into(),
            message: message.into(),
            line,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display_names_document_record_and_line() {
        let err = Error::malformed(Document::Tokens, "token 3", "missing TokenIdentifier/Name", 42);
        let msg = err.to_string();
        assert!(msg.contains("Tokens.xml"));
        assert!(msg.contains("line 42"));
        assert!(msg.contains("token 3"));
        assert!(msg.contains("missing TokenIdentifier/Name"));
    }

    #[test]
    fn missing_input_display_names_path() {
        let err = Error::MissingInput {
            path: PathBuf::from("/tmp/x/Nodes.xml"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/tmp/x/Nodes.xml"));
    }

    #[test]
    fn sqlite_errors_convert_to_store_write() {
        let err: Error = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, Error::StoreWrite(_)));
    }
}
