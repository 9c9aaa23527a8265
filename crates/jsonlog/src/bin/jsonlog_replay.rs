//! JSON log replay - rebuild an analysis report from a captured observation stream
//!
//! Usage:
//!   jsonlog-replay [OPTIONS] <OBSERVATIONS_JSONL> <OUTPUT_DIR>
//!
//! Each input line is one tagged observation, e.g.
//!   {"kind": "code", "snippet": "eval(x)", "language": "javascript", "relationship": "script"}
//! Malformed lines are skipped with a warning.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use thug_core::{OutputFormat, RunOptions};
use thug_jsonlog::{JsonLog, Observation};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thug_jsonlog=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut options_path: Option<PathBuf> = None;
    let mut print = false;
    let mut positional: Vec<&str> = vec![];

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--options" => {
                i += 1;
                match args.get(i) {
                    Some(p) => options_path = Some(PathBuf::from(p)),
                    None => {
                        eprintln!("--options requires a file");
                        return ExitCode::from(2);
                    }
                }
            }
            "--print" => print = true,
            "help" | "--help" | "-h" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            other => positional.push(other),
        }
        i += 1;
    }

    if positional.len() != 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let mut options = match options_path {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(thug_core::JsonLogError::from)
            .and_then(|s| RunOptions::from_json_str(&s))
        {
            Ok(opts) => opts,
            Err(e) => {
                eprintln!("Failed to load options from {:?}: {}", path, e);
                return ExitCode::from(1);
            }
        },
        None => RunOptions::from_env(),
    };
    // A replay always wants the report on disk
    options.json_logging = true;
    options.file_logging = true;
    options.output_formats.insert(OutputFormat::Json);

    let input = PathBuf::from(positional[0]);
    let output = PathBuf::from(positional[1]);

    let file = match File::open(&input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open {:?}: {}", input, e);
            return ExitCode::from(1);
        }
    };

    let mut log = JsonLog::new(env!("CARGO_PKG_VERSION"), options);
    let mut replayed = 0usize;
    let mut skipped = 0usize;

    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!("Read failed at line {}: {}", lineno + 1, e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Observation>(&line) {
            Ok(obs) => {
                log.record(&obs);
                replayed += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping line {}: {}", lineno + 1, e);
                skipped += 1;
            }
        }
    }

    if let Err(e) = log.export(&output) {
        tracing::error!("Export failed: {}", e);
        return ExitCode::from(1);
    }

    tracing::info!(replayed, skipped, "Replay complete");

    if print {
        if let Some(text) = log.get_serialized() {
            println!("{}", text);
        }
    }

    ExitCode::SUCCESS
}

fn print_usage() {
    eprintln!(
        r#"JSON log replay - rebuild an analysis report from observations

USAGE:
    jsonlog-replay [OPTIONS] <OBSERVATIONS_JSONL> <OUTPUT_DIR>

OPTIONS:
    --options <FILE>    Run options as JSON (default: THUG_* environment)
    --print             Print the serialized report to stdout

OUTPUT:
    <OUTPUT_DIR>/analysis/json/analysis.json
    <OUTPUT_DIR>/analysis/json/graph.dot
"#
    );
}
