//! CLI argument parsing with clap.
//!
//! Mirrors `docsetutil`'s verb-first layout: `doxysetutil <verb> [options] <docset>`.

use clap::{Args, Parser, Subcommand};
use doxyset_core::{IndexConfigOverride, RootPolicy};
use std::path::PathBuf;

/// doxysetutil - build docset search indexes from Tokens.xml and Nodes.xml
#[derive(Parser, Debug)]
#[command(
    name = "doxysetutil",
    version,
    about = "Build docset search indexes from Tokens.xml and Nodes.xml",
    after_help = CLI_AFTER_HELP
)]
pub struct Cli {
    #[command(subcommand)]
    pub verb: Verb,

    /// Print additional information about the operation being performed
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Print debugging information (every token and node processed)
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    /// Read settings from a TOML file (default: $DOXYSET_CONFIG)
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Verb {
    /// Convert the XML files into a searchable index
    Index(IndexArgs),
    /// (not implemented) Search the full text and API indexes for the specified terms
    Search(PassthroughArgs),
    /// (not implemented) Verify that every file referenced by the indexes exists
    Validate(PassthroughArgs),
    /// (not implemented) Print out the contents of the indexes
    Dump(PassthroughArgs),
    /// (not implemented) Generate an archive of the documentation
    Package(PassthroughArgs),
}

impl Verb {
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Index(_) => "index",
            Verb::Search(_) => "search",
            Verb::Validate(_) => "validate",
            Verb::Dump(_) => "dump",
            Verb::Package(_) => "package",
        }
    }
}

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Path to the .docset bundle
    #[arg(value_name = "DOCSET")]
    pub docset: PathBuf,

    /// Perform the operation using a particular localization (accepted, not applied)
    #[arg(long = "localization", value_name = "LOC")]
    pub localization: Option<String>,

    /// Only documents at or below a ':'-separated node path (accepted, not applied)
    #[arg(long = "node", value_name = "NODEPATH")]
    pub node: Option<String>,

    /// Do not build the full-text index (accepted, not applied)
    #[arg(long = "skip-text")]
    pub skip_text: bool,

    /// Do not build the API index (accepted, not applied)
    #[arg(long = "skip-api")]
    pub skip_api: bool,

    /// Which top-level node becomes the docset root: first, last or single
    #[arg(long = "root-policy", value_name = "POLICY", value_parser = parse_root_policy)]
    pub root_policy: Option<RootPolicy>,

    /// Value written as the docset configuration version
    #[arg(long = "configuration-version", value_name = "VERSION")]
    pub configuration_version: Option<String>,
}

impl IndexArgs {
    /// Flags given on the command line; unset flags leave the config file's value.
    pub fn overrides(&self) -> IndexConfigOverride {
        IndexConfigOverride {
            localization: self.localization.clone().map(Some),
            node: self.node.clone().map(Some),
            skip_text: self.skip_text.then_some(true),
            skip_api: self.skip_api.then_some(true),
            configuration_version: self.configuration_version.clone(),
            root_policy: self.root_policy,
        }
    }
}

/// Arguments of verbs that are recognised but not implemented.
#[derive(Args, Debug)]
pub struct PassthroughArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub args: Vec<String>,
}

fn parse_root_policy(s: &str) -> Result<RootPolicy, String> {
    match s {
        "first" => Ok(RootPolicy::First),
        "last" => Ok(RootPolicy::Last),
        "single" => Ok(RootPolicy::Single),
        other => Err(format!(
            "unknown root policy '{}' (expected first, last or single)",
            other
        )),
    }
}

const CLI_AFTER_HELP: &str = r#"EXAMPLES:
  doxysetutil index Foo.docset              Build Foo.docset/Contents/Resources/docSet.dsidx
  doxysetutil index -v Foo.docset           Same, printing progress and a summary
  doxysetutil index --debug Foo.docset      Log every token and node
  doxysetutil index --root-policy single Foo.docset
                                            Fail unless Nodes.xml has exactly one top-level node

CONFIG (TOML, via --config or $DOXYSET_CONFIG):
  localization, node, skip_text, skip_api, configuration_version, root_policy"#;
