//! Frozen store schema and store initialization.
//!
//! The table, index and view layout mirrors the Core Data store written by
//! Apple's `docsetutil`. Documentation browsers read these names directly, so
//! the DDL is executed verbatim and never migrated or extended.

use crate::error::{Error, Result};
use log::debug;
use rusqlite::Connection;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Core Data entity numbers (`Z_ENT`) as docsetutil assigns them.
pub mod entity {
    pub const API_LANGUAGE: i64 = 1;
    pub const CONTAINER: i64 = 2;
    pub const DOCSET: i64 = 4;
    pub const FILE_PATH: i64 = 6;
    pub const HEADER: i64 = 7;
    pub const NODE: i64 = 8;
    pub const NODE_URL: i64 = 9;
    pub const ORDERED_SUBNODE: i64 = 11;
    pub const TOKEN: i64 = 14;
    pub const TOKEN_META_INFORMATION: i64 = 16;
    pub const TOKEN_TYPE: i64 = 17;
}

/// Tables, indexes, bookkeeping tables and the `searchIndex` view.
pub const SCHEMA_SQL: &str = "
    CREATE TABLE ZAPILANGUAGE ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZFULLNAME VARCHAR );
    CREATE TABLE Z_1NODES ( Z_1APILANGUAGES INTEGER, Z_8NODES INTEGER, PRIMARY KEY (Z_1APILANGUAGES, Z_8NODES) );
    CREATE TABLE ZCONTAINER ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZCONTAINERNAME VARCHAR );
    CREATE TABLE Z_2ADOPTEDBY ( Z_2PROTOCOLCONTAINERS INTEGER, Z_14ADOPTEDBY INTEGER, PRIMARY KEY (Z_2PROTOCOLCONTAINERS, Z_14ADOPTEDBY) );
    CREATE TABLE Z_2SUBCLASSEDBY ( Z_2SUPERCLASSCONTAINERS INTEGER, Z_14SUBCLASSEDBY INTEGER, PRIMARY KEY (Z_2SUPERCLASSCONTAINERS, Z_14SUBCLASSEDBY) );
    CREATE TABLE ZDISTRIBUTIONVERSION ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZARCHITECTUREFLAGS INTEGER, ZDISTRIBUTIONNAME VARCHAR, ZVERSIONSTRING VARCHAR );
    CREATE TABLE Z_3REMOVEDAFTERINVERSE ( Z_3REMOVEDAFTERVERSIONS INTEGER, Z_16REMOVEDAFTERINVERSE INTEGER, PRIMARY KEY (Z_3REMOVEDAFTERVERSIONS, Z_16REMOVEDAFTERINVERSE) );
    CREATE TABLE Z_3INTRODUCEDININVERSE ( Z_3INTRODUCEDINVERSIONS INTEGER, Z_16INTRODUCEDININVERSE INTEGER, PRIMARY KEY (Z_3INTRODUCEDINVERSIONS, Z_16INTRODUCEDININVERSE) );
    CREATE TABLE Z_3DEPRECATEDININVERSE ( Z_3DEPRECATEDINVERSIONS INTEGER, Z_16DEPRECATEDININVERSE INTEGER, PRIMARY KEY (Z_3DEPRECATEDINVERSIONS, Z_16DEPRECATEDININVERSE) );
    CREATE TABLE ZDOCSET ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZROOTNODE INTEGER, ZCONFIGURATIONVERSION VARCHAR );
    CREATE TABLE ZDOWNLOADABLEFILE ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZTYPE INTEGER, ZNODE INTEGER, ZURL VARCHAR );
    CREATE TABLE ZFILEPATH ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZPATH VARCHAR );
    CREATE TABLE ZHEADER ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZFRAMEWORKNAME VARCHAR, ZHEADERPATH VARCHAR );
    CREATE TABLE ZNODE ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZINSTALLDOMAIN INTEGER, ZKDOCUMENTTYPE INTEGER, ZKID INTEGER, ZKISSEARCHABLE INTEGER, ZKNODETYPE INTEGER, ZKSUBNODECOUNT INTEGER, ZPRIMARYPARENT INTEGER, ZKNAME VARCHAR );
    CREATE TABLE Z_8RELATEDNODESINVERSE ( Z_8RELATEDNODES INTEGER, Z_8RELATEDNODESINVERSE INTEGER, PRIMARY KEY (Z_8RELATEDNODES, Z_8RELATEDNODESINVERSE) );
    CREATE TABLE Z_8RELATEDDOCSINVERSE ( Z_8RELATEDDOCUMENTS INTEGER, Z_16RELATEDDOCSINVERSE INTEGER, PRIMARY KEY (Z_8RELATEDDOCUMENTS, Z_16RELATEDDOCSINVERSE) );
    CREATE TABLE Z_8RELATEDSCINVERSE ( Z_8RELATEDSAMPLECODE INTEGER, Z_16RELATEDSCINVERSE INTEGER, PRIMARY KEY (Z_8RELATEDSAMPLECODE, Z_16RELATEDSCINVERSE) );
    CREATE TABLE ZNODEURL ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZCHECKSUM INTEGER, ZNODE INTEGER, ZANCHOR VARCHAR, ZBASEURL VARCHAR, ZFILENAME VARCHAR, ZPATH VARCHAR );
    CREATE TABLE ZNODEUUID ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZNODE INTEGER, ZUUID VARCHAR );
    CREATE TABLE ZORDEREDSUBNODE ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZORDER INTEGER, ZNODE INTEGER, ZPARENT INTEGER );
    CREATE TABLE ZPARAMETER ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZORDER INTEGER, Z16PARAMETERS INTEGER, ZABSTRACT VARCHAR, ZPARAMETERNAME VARCHAR );
    CREATE TABLE ZRETURNVALUE ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZABSTRACT VARCHAR );
    CREATE TABLE ZTOKEN ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZALPHASORTORDER INTEGER, ZFIRSTLOWERCASEUTF8BYTE INTEGER, ZCONTAINER INTEGER, ZLANGUAGE INTEGER, ZMETAINFORMATION INTEGER, ZPARENTNODE INTEGER, ZTOKENTYPE INTEGER, ZTOKENNAME VARCHAR, ZTOKENUSR VARCHAR );
    CREATE TABLE Z_14RELATEDGROUPS ( Z_14TOKENS INTEGER, Z_15RELATEDGROUPS INTEGER, PRIMARY KEY (Z_14TOKENS, Z_15RELATEDGROUPS) );
    CREATE TABLE Z_14RELATEDTOKENSINVERSE ( Z_14RELATEDTOKENS INTEGER, Z_16RELATEDTOKENSINVERSE INTEGER, PRIMARY KEY (Z_14RELATEDTOKENS, Z_16RELATEDTOKENSINVERSE) );
    CREATE TABLE ZTOKENGROUP ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZTITLE VARCHAR );
    CREATE TABLE ZTOKENMETAINFORMATION ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZDECLAREDIN INTEGER, ZFILE INTEGER, ZRETURNVALUE INTEGER, ZTOKEN INTEGER, ZABSTRACT VARCHAR, ZANCHOR VARCHAR, ZDECLARATION VARCHAR, ZDEPRECATIONSUMMARY VARCHAR );
    CREATE TABLE ZTOKENTYPE ( Z_PK INTEGER PRIMARY KEY, Z_ENT INTEGER, Z_OPT INTEGER, ZTYPENAME VARCHAR );
    CREATE INDEX Z_1NODES_Z_8NODES_INDEX ON Z_1NODES (Z_8NODES, Z_1APILANGUAGES);
    CREATE INDEX Z_2ADOPTEDBY_Z_14ADOPTEDBY_INDEX ON Z_2ADOPTEDBY (Z_14ADOPTEDBY, Z_2PROTOCOLCONTAINERS);
    CREATE INDEX Z_2SUBCLASSEDBY_Z_14SUBCLASSEDBY_INDEX ON Z_2SUBCLASSEDBY (Z_14SUBCLASSEDBY, Z_2SUPERCLASSCONTAINERS);
    CREATE INDEX Z_3REMOVEDAFTERINVERSE_Z_16REMOVEDAFTERINVERSE_INDEX ON Z_3REMOVEDAFTERINVERSE (Z_16REMOVEDAFTERINVERSE, Z_3REMOVEDAFTERVERSIONS);
    CREATE INDEX Z_3INTRODUCEDININVERSE_Z_16INTRODUCEDININVERSE_INDEX ON Z_3INTRODUCEDININVERSE (Z_16INTRODUCEDININVERSE, Z_3INTRODUCEDINVERSIONS);
    CREATE INDEX Z_3DEPRECATEDININVERSE_Z_16DEPRECATEDININVERSE_INDEX ON Z_3DEPRECATEDININVERSE (Z_16DEPRECATEDININVERSE, Z_3DEPRECATEDINVERSIONS);
    CREATE INDEX ZDOCSET_ZROOTNODE_INDEX ON ZDOCSET (ZROOTNODE);
    CREATE INDEX ZDOWNLOADABLEFILE_ZNODE_INDEX ON ZDOWNLOADABLEFILE (ZNODE);
    CREATE INDEX ZNODE_ZKID_INDEX ON ZNODE (ZKID);
    CREATE INDEX ZNODE_ZPRIMARYPARENT_INDEX ON ZNODE (ZPRIMARYPARENT);
    CREATE INDEX Z_8RELATEDNODESINVERSE_Z_8RELATEDNODESINVERSE_INDEX ON Z_8RELATEDNODESINVERSE (Z_8RELATEDNODESINVERSE, Z_8RELATEDNODES);
    CREATE INDEX Z_8RELATEDDOCSINVERSE_Z_16RELATEDDOCSINVERSE_INDEX ON Z_8RELATEDDOCSINVERSE (Z_16RELATEDDOCSINVERSE, Z_8RELATEDDOCUMENTS);
    CREATE INDEX Z_8RELATEDSCINVERSE_Z_16RELATEDSCINVERSE_INDEX ON Z_8RELATEDSCINVERSE (Z_16RELATEDSCINVERSE, Z_8RELATEDSAMPLECODE);
    CREATE INDEX ZNODEURL_ZCHECKSUM_INDEX ON ZNODEURL (ZCHECKSUM);
    CREATE INDEX ZNODEURL_ZNODE_INDEX ON ZNODEURL (ZNODE);
    CREATE INDEX ZNODEUUID_ZNODE_INDEX ON ZNODEUUID (ZNODE);
    CREATE INDEX ZORDEREDSUBNODE_ZNODE_INDEX ON ZORDEREDSUBNODE (ZNODE);
    CREATE INDEX ZORDEREDSUBNODE_ZPARENT_INDEX ON ZORDEREDSUBNODE (ZPARENT);
    CREATE INDEX ZPARAMETER_Z16PARAMETERS_INDEX ON ZPARAMETER (Z16PARAMETERS);
    CREATE INDEX ZTOKEN_ZALPHASORTORDER_INDEX ON ZTOKEN (ZALPHASORTORDER);
    CREATE INDEX ZTOKEN_ZFIRSTLOWERCASEUTF8BYTE_INDEX ON ZTOKEN (ZFIRSTLOWERCASEUTF8BYTE);
    CREATE INDEX ZTOKEN_ZTOKENNAME_INDEX ON ZTOKEN (ZTOKENNAME);
    CREATE INDEX ZTOKEN_ZTOKENUSR_INDEX ON ZTOKEN (ZTOKENUSR);
    CREATE INDEX ZTOKEN_ZCONTAINER_INDEX ON ZTOKEN (ZCONTAINER);
    CREATE INDEX ZTOKEN_ZLANGUAGE_INDEX ON ZTOKEN (ZLANGUAGE);
    CREATE INDEX ZTOKEN_ZMETAINFORMATION_INDEX ON ZTOKEN (ZMETAINFORMATION);
    CREATE INDEX ZTOKEN_ZPARENTNODE_INDEX ON ZTOKEN (ZPARENTNODE);
    CREATE INDEX ZTOKEN_ZTOKENTYPE_INDEX ON ZTOKEN (ZTOKENTYPE);
    CREATE INDEX Z_14RELATEDGROUPS_Z_15RELATEDGROUPS_INDEX ON Z_14RELATEDGROUPS (Z_15RELATEDGROUPS, Z_14TOKENS);
    CREATE INDEX Z_14RELATEDTOKENSINVERSE_Z_16RELATEDTOKENSINVERSE_INDEX ON Z_14RELATEDTOKENSINVERSE (Z_16RELATEDTOKENSINVERSE, Z_14RELATEDTOKENS);
    CREATE INDEX ZTOKENMETAINFORMATION_ZDECLAREDIN_INDEX ON ZTOKENMETAINFORMATION (ZDECLAREDIN);
    CREATE INDEX ZTOKENMETAINFORMATION_ZFILE_INDEX ON ZTOKENMETAINFORMATION (ZFILE);
    CREATE INDEX ZTOKENMETAINFORMATION_ZRETURNVALUE_INDEX ON ZTOKENMETAINFORMATION (ZRETURNVALUE);
    CREATE INDEX ZTOKENMETAINFORMATION_ZTOKEN_INDEX ON ZTOKENMETAINFORMATION (ZTOKEN);
    CREATE TABLE Z_PRIMARYKEY (Z_ENT INTEGER PRIMARY KEY, Z_NAME VARCHAR, Z_SUPER INTEGER, Z_MAX INTEGER);
    CREATE TABLE Z_METADATA (Z_VERSION INTEGER PRIMARY KEY, Z_UUID VARCHAR(255), Z_PLIST BLOB);
    CREATE TABLE Z_MODELCACHE (Z_CONTENT BLOB);
    CREATE INDEX __zi_name0001 ON ztoken (ztokenname COLLATE NOCASE);
    CREATE VIEW searchIndex AS  SELECT    ztokenname AS name,    ztypename AS type,    zpath AS path,    zanchor AS fragment  FROM ztoken  INNER JOIN ztokenmetainformation    ON ztoken.zmetainformation = ztokenmetainformation.z_pk  INNER JOIN zfilepath    ON ztokenmetainformation.zfile = zfilepath.z_pk  INNER JOIN ztokentype    ON ztoken.ztokentype = ztokentype.z_pk;
";

/// Every table name created by [`SCHEMA_SQL`].
pub const TABLES: &[&str] = &[
    "ZAPILANGUAGE",
    "Z_1NODES",
    "ZCONTAINER",
    "Z_2ADOPTEDBY",
    "Z_2SUBCLASSEDBY",
    "ZDISTRIBUTIONVERSION",
    "Z_3REMOVEDAFTERINVERSE",
    "Z_3INTRODUCEDININVERSE",
    "Z_3DEPRECATEDININVERSE",
    "ZDOCSET",
    "ZDOWNLOADABLEFILE",
    "ZFILEPATH",
    "ZHEADER",
    "ZNODE",
    "Z_8RELATEDNODESINVERSE",
    "Z_8RELATEDDOCSINVERSE",
    "Z_8RELATEDSCINVERSE",
    "ZNODEURL",
    "ZNODEUUID",
    "ZORDEREDSUBNODE",
    "ZPARAMETER",
    "ZRETURNVALUE",
    "ZTOKEN",
    "Z_14RELATEDGROUPS",
    "Z_14RELATEDTOKENSINVERSE",
    "ZTOKENGROUP",
    "ZTOKENMETAINFORMATION",
    "ZTOKENTYPE",
    "Z_PRIMARYKEY",
    "Z_METADATA",
    "Z_MODELCACHE",
];

/// Delete any store at `path` and create a fresh one holding the empty schema.
///
/// The schema is created inside a single transaction: either the whole layout
/// exists afterwards or the call fails before any data can be written.
pub fn initialize(path: &Path) -> Result<Connection> {
    remove_store(path)?;

    let mut conn = Connection::open(path)?;
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.commit()?;

    debug!("created schema in {}", path.display());
    Ok(conn)
}

/// Remove the store file at `path`. A missing file is not an error.
pub fn remove_store(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}
