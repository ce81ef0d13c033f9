//! Purpose: Execute parsed CLI subcommands against the library API.
//! Exports: `dispatch`.
//! Role: Keeps I/O plumbing (files, stdin/stdout) out of the codec.
//! Invariants: Argument validation happens before any input is read or encoded.
//! Invariants: Binary output is written in one piece after packing succeeds.
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use clap::CommandFactory;
use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use typedmatrix::api::{
    Column, Error, ErrorKind, FrameFormat, Orientation, PackOptions, pack, read_frame,
    unpack_with, utc_timestamp_float32, utc_timestamp_float32_now,
};
use typedmatrix::core::schema::infer_columns;
use typedmatrix::json::{TimeFields, parse_records};

use crate::{Cli, Command};

pub(super) fn dispatch(command: Command) -> Result<(), Error> {
    match command {
        Command::Pack {
            input,
            out,
            orientation,
            columns,
            extra_json,
            time_fields,
            legacy,
        } => {
            let orientation = orientation.parse::<Orientation>()?;
            let columns = columns
                .iter()
                .map(|spec| Column::parse_spec(spec))
                .collect::<Result<Vec<_>, _>>()?;
            let extra = match extra_json {
                Some(text) => parse_extra(&text)?,
                None => Map::new(),
            };
            let mut options = PackOptions::new()
                .orientation(orientation)
                .extra(extra)
                .format(frame_format(legacy));
            if !columns.is_empty() {
                options = options.columns(columns);
            }
            let records = parse_records(&read_input(input.as_deref())?, &TimeFields::new(time_fields))?;
            let frame = pack(&records, &options)?;
            write_output(out.as_deref(), &frame)
        }
        Command::Unpack {
            input,
            legacy,
            pretty,
        } => {
            let buf = read_input(input.as_deref())?;
            let (header, records) = unpack_with(&buf, frame_format(legacy))?;
            emit_json(&json!({"header": header, "records": records}), pretty)
        }
        Command::Columns {
            input,
            time_fields,
            legacy,
        } => {
            let records = parse_records(&read_input(input.as_deref())?, &TimeFields::new(time_fields))?;
            let columns = infer_columns(&records, frame_format(legacy))?;
            emit_json(&json!(columns), false)
        }
        Command::Inspect { input, legacy } => {
            let buf = read_input(input.as_deref())?;
            let frame = read_frame(&buf, frame_format(legacy))?;
            emit_json(
                &json!({
                    "format": frame.format.as_str(),
                    "version": frame.version,
                    "orientation": frame.orientation.as_str(),
                    "header_len": frame.header_len,
                    "payload_len": frame.payload.len(),
                    "header": frame.header,
                }),
                false,
            )
        }
        Command::Timestamp { at } => {
            let timestamp = match at {
                Some(text) => {
                    let instant = OffsetDateTime::parse(&text, &Rfc3339).map_err(|err| {
                        Error::new(ErrorKind::Usage)
                            .with_message(format!("invalid RFC 3339 timestamp {text:?}"))
                            .with_source(err)
                    })?;
                    utc_timestamp_float32(instant)
                }
                None => utc_timestamp_float32_now(),
            };
            emit_json(&json!({"timestamp": timestamp}), false)
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "typedmatrix", &mut io::stdout());
            Ok(())
        }
    }
}

fn frame_format(legacy: bool) -> FrameFormat {
    if legacy {
        FrameFormat::Legacy
    } else {
        FrameFormat::Tagged
    }
}

fn parse_extra(text: &str) -> Result<Map<String, Value>, Error> {
    let value: Value = serde_json::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("--extra-json is not valid JSON")
            .with_source(err)
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::new(ErrorKind::Usage).with_message("--extra-json must be a JSON object")),
    }
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>, Error> {
    match path {
        Some(path) if path != Path::new("-") => fs::read(path).map_err(|err| io_error(err, path)),
        _ => {
            let mut buf = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .map_err(|err| io_error(err, Path::new("<stdin>")))?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<(), Error> {
    match path {
        Some(path) if path != Path::new("-") => {
            fs::write(path, bytes).map_err(|err| io_error(err, path))
        }
        _ => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(bytes)
                .and_then(|()| stdout.flush())
                .map_err(|err| io_error(err, Path::new("<stdout>")))
        }
    }
}

fn emit_json(value: &Value, pretty: bool) -> Result<(), Error> {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    let text = encoded.map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("json encode failed")
            .with_source(err)
    })?;
    println!("{text}");
    Ok(())
}

fn io_error(err: io::Error, path: &Path) -> Error {
    Error::new(ErrorKind::Io)
        .with_message(format!("cannot access {}", path.display()))
        .with_source(err)
}
