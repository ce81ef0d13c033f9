//! Purpose: `typedmatrix` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON or frames on stdout.
//! Invariants: Binary frames go to stdout or `--out`; everything else on stdout is JSON.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use typedmatrix::api::{Error, ErrorKind, to_exit_code};

#[derive(Parser)]
#[command(
    name = "typedmatrix",
    version,
    about = "Pack JSON records into compact TypedMatrix binary frames and back",
    long_about = None,
    after_help = r#"EXAMPLES
  $ echo '[{"a": 1.5, "b": 2}, {"a": 3.0, "b": 4}]' | typedmatrix pack -o rows.tmtx
  $ typedmatrix unpack rows.tmtx --pretty
  $ typedmatrix pack data.json --orientation columnwise --column depth:Float32 -o cols.tmtx
  $ typedmatrix inspect cols.tmtx"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Pack a JSON object or array of objects into a frame")]
    Pack {
        #[arg(help = "JSON input file (default: stdin)", value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        #[arg(
            short,
            long,
            help = "Write the frame to this file (default: stdout)",
            value_hint = ValueHint::FilePath
        )]
        out: Option<PathBuf>,
        #[arg(
            long,
            default_value = "rowwise",
            help = "Payload layout: rowwise|columnwise"
        )]
        orientation: String,
        #[arg(
            long = "column",
            value_name = "NAME:TYPE",
            help = "Repeatable column definition; skips schema inference (types: Float32, Int32)"
        )]
        columns: Vec<String>,
        #[arg(long, value_name = "JSON", help = "Extra header fields as a JSON object")]
        extra_json: Option<String>,
        #[arg(
            long = "time-field",
            value_name = "NAME",
            help = "Repeatable field whose strings are RFC 3339 timestamps"
        )]
        time_fields: Vec<String>,
        #[arg(long, help = "Write the legacy frame (no magic, version, or orientation)")]
        legacy: bool,
    },
    #[command(about = "Decode a frame and print its header and records as JSON")]
    Unpack {
        #[arg(help = "Frame file (default: stdin)", value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        #[arg(long, help = "Read a legacy frame")]
        legacy: bool,
        #[arg(long, help = "Pretty-print the JSON output")]
        pretty: bool,
    },
    #[command(about = "Print the columns inferred from JSON records")]
    Columns {
        #[arg(help = "JSON input file (default: stdin)", value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        #[arg(
            long = "time-field",
            value_name = "NAME",
            help = "Repeatable field whose strings are RFC 3339 timestamps"
        )]
        time_fields: Vec<String>,
        #[arg(long, help = "Use the legacy type table (ints become Int32)")]
        legacy: bool,
    },
    #[command(about = "Print a frame's envelope and header without decoding the payload")]
    Inspect {
        #[arg(help = "Frame file (default: stdin)", value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        #[arg(long, help = "Read a legacy frame")]
        legacy: bool,
    },
    #[command(about = "Print a Float32 millisecond UTC timestamp")]
    Timestamp {
        #[arg(long, value_name = "RFC3339", help = "Instant to convert (default: now)")]
        at: Option<String>,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match command_dispatch::dispatch(cli.command) {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::UnsupportedType => "unsupported type".to_string(),
        ErrorKind::InvalidOrientation => "invalid orientation".to_string(),
        ErrorKind::BadMagic => "not a TypedMatrix frame".to_string(),
        ErrorKind::UnsupportedVersion => "unsupported frame version".to_string(),
        ErrorKind::TimestampToInteger => "timestamp in integer column".to_string(),
        ErrorKind::Truncated => "frame is truncated".to_string(),
        ErrorKind::Corrupt => "corrupt frame".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(field) = err.field() {
        inner.insert("field".to_string(), json!(field));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(field) = err.field() {
        lines.push(format!("field: {field}"));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!("offset: {offset}"));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}
