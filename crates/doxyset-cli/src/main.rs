mod cli;
mod config;

use clap::Parser;
use cli::{Cli, Verb};
use doxyset_core::{DocsetPaths, build_index, store_status};
use log::{LevelFilter, debug, info};
use std::process::ExitCode;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Index(#[from] doxyset_core::Error),

    #[error("verb '{verb}' is not implemented (arguments: {})", args.join(" "))]
    NotImplemented {
        verb: &'static str,
        args: Vec<String>,
    },
}

/// `-v` enables info, `--debug` enables per-record logging; `RUST_LOG` still wins.
fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.verb {
        Verb::Index(ref args) => {
            let paths = DocsetPaths::new(&args.docset);
            let config = config::resolve_config(cli.config.as_deref(), &args.overrides())?;
            debug!("effective config: {:?}", config);

            let stats = build_index(&paths, &config)?;
            if cli.verbose {
                println!("{}", stats);
                println!("{}", store_status(&paths.index)?);
            }
            Ok(())
        }
        Verb::Search(ref p) | Verb::Validate(ref p) | Verb::Dump(ref p) | Verb::Package(ref p) => {
            info!("verb '{}' recognised", cli.verb.name());
            Err(CliError::NotImplemented {
                verb: cli.verb.name(),
                args: p.args.clone(),
            })
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("doxysetutil: {}", e);
            ExitCode::FAILURE
        }
    }
}
