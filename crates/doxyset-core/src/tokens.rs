//! Token indexer: writes one `ZTOKEN` and one `ZTOKENMETAINFORMATION` row per symbol.
//!
//! The two rows reference each other. The meta-information row is inserted
//! first with `ZTOKEN` unset, the token row is inserted pointing at it, and
//! the meta-information row is then patched with the token's id.

use crate::error::Result;
use crate::input::TokenRecord;
use crate::lookup::{LookupCache, LookupCategory};
use crate::schema::entity;
use log::debug;
use rusqlite::{Connection, params};

/// Ids written for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedToken {
    pub token_id: i64,
    pub meta_id: i64,
}

/// First UTF-8 byte of the lowercased name, stored in `ZFIRSTLOWERCASEUTF8BYTE`.
pub fn first_lowercase_utf8_byte(name: &str) -> Option<u8> {
    let first = name.chars().next()?.to_lowercase().next()?;
    let mut buf = [0u8; 4];
    first.encode_utf8(&mut buf).as_bytes().first().copied()
}

/// Insert a single token and its meta-information.
pub fn insert_token(
    conn: &Connection,
    cache: &mut LookupCache,
    token: &TokenRecord,
) -> Result<IndexedToken> {
    let language = cache.resolve(conn, LookupCategory::Language, &token.language)?;
    let token_type = cache.resolve(conn, LookupCategory::TokenType, &token.kind)?;
    let container = cache.resolve(conn, LookupCategory::Container, &token.scope)?;
    let file = cache.resolve(conn, LookupCategory::FilePath, &token.path)?;
    let header = cache.resolve(conn, LookupCategory::Header, &token.declared_in)?;

    // ZRETURNVALUE and ZTOKEN stay NULL; ZTOKEN is patched below.
    conn.execute(
        "INSERT INTO ZTOKENMETAINFORMATION
             (Z_ENT, Z_OPT, ZDECLAREDIN, ZFILE, ZRETURNVALUE, ZTOKEN,
              ZABSTRACT, ZANCHOR, ZDECLARATION, ZDEPRECATIONSUMMARY)
         VALUES (?1, 1, ?2, ?3, NULL, NULL, ?4, ?5, '', '')",
        params![
            entity::TOKEN_META_INFORMATION,
            header,
            file,
            token.abstract_text,
            token.anchor,
        ],
    )?;
    let meta_id = conn.last_insert_rowid();

    // ZALPHASORTORDER and ZPARENTNODE have no source in the input.
    conn.execute(
        "INSERT INTO ZTOKEN
             (Z_ENT, Z_OPT, ZALPHASORTORDER, ZFIRSTLOWERCASEUTF8BYTE, ZCONTAINER,
              ZLANGUAGE, ZMETAINFORMATION, ZPARENTNODE, ZTOKENTYPE, ZTOKENNAME, ZTOKENUSR)
         VALUES (?1, 2, NULL, ?2, ?3, ?4, ?5, NULL, ?6, ?7, '')",
        params![
            entity::TOKEN,
            first_lowercase_utf8_byte(&token.name),
            container,
            language,
            meta_id,
            token_type,
            token.name,
        ],
    )?;
    let token_id = conn.last_insert_rowid();

    conn.execute(
        "UPDATE ZTOKENMETAINFORMATION SET ZTOKEN = ?1 WHERE Z_PK = ?2",
        params![token_id, meta_id],
    )?;

    Ok(IndexedToken { token_id, meta_id })
}

/// Insert every token in input order. Returns the number of tokens written.
pub fn index_tokens(
    conn: &Connection,
    cache: &mut LookupCache,
    tokens: &[TokenRecord],
) -> Result<usize> {
    let total = tokens.len();
    for (i, token) in tokens.iter().enumerate() {
        debug!("[{}/{}] Processing token: {}", i + 1, total, token.name);
        insert_token(conn, cache, token)?;
    }
    Ok(total)
}
