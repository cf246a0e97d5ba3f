/**
 * Decorator Metadata Simplifier CLI - msimplify
 *
 * Simplifies compiled decorator metadata in JavaScript files
 */
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use metadata_simplifier::Simplifier;
use metadata_simplifier_cli::parallel::{simplify_files, Mode, Summary};
use metadata_simplifier_cli::{config, files, logging, version};

fn command() -> Command {
    Command::new("msimplify")
        .version(version())
        .about("Drops redundant TypeScript decorator metadata from compiled JavaScript")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Plugin config JSON (defaults to ./msimplify.json when present)"),
        )
        .arg(
            Arg::new("write")
                .short('w')
                .long("write")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["out-dir", "check"])
                .help("Rewrite changed files in place"),
        )
        .arg(
            Arg::new("out-dir")
                .short('o')
                .long("out-dir")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .conflicts_with("check")
                .help("Write outputs under DIR instead of stdout"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Exit with status 1 if any file would change"),
        )
        .arg(
            Arg::new("paths")
                .value_name("PATHS")
                .num_args(1..)
                .required(true)
                .help("Files, directories or glob patterns"),
        )
}

fn mode(matches: &ArgMatches) -> Mode {
    if matches.get_flag("write") {
        Mode::Write
    } else if let Some(dir) = matches.get_one::<PathBuf>("out-dir") {
        Mode::OutDir(dir.clone())
    } else if matches.get_flag("check") {
        Mode::Check
    } else {
        Mode::Print
    }
}

fn main() {
    logging::init_tracing();
    let matches = command().get_matches();
    let started = Instant::now();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let (plugin_config, config_path) = match config::resolve(matches.get_one::<PathBuf>("config").map(PathBuf::as_path), &cwd) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    };
    if let Some(path) = &config_path {
        tracing::info!(config = %path.display(), "loaded config");
    }

    let paths: Vec<String> = matches.get_many::<String>("paths").into_iter().flatten().cloned().collect();
    let inputs = match files::expand(&paths) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    };

    let mode = mode(&matches);
    let simplifier = Simplifier::new(plugin_config);
    let outcomes = simplify_files(&inputs, &simplifier, &mode);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(file) => {
                if let Some(code) = &file.code {
                    if inputs.len() > 1 {
                        let _ = writeln!(out, "// {}", outcome.path.display());
                    }
                    let _ = out.write_all(code.as_bytes());
                }
                if mode == Mode::Check && file.changed {
                    eprintln!("would simplify {}", outcome.path.display());
                }
                for (offset, conflict) in &file.report.rolled_back {
                    eprintln!("warning: {}:{offset}: kept original site, {conflict}", outcome.path.display());
                }
            }
            Err(e) => eprintln!("Error: {}: {e:#}", outcome.path.display()),
        }
    }
    let _ = out.flush();

    let summary = Summary::collect(&outcomes, started);
    eprintln!("msimplify: {summary}");

    if summary.failed > 0 || (mode == Mode::Check && summary.changed > 0) {
        process::exit(1);
    }
}
