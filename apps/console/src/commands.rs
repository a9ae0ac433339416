//! Line commands understood by the console.

use std::path::{Path, PathBuf};

use anyhow::Context;
use client_core::{DragEventKind, ZoneId};
use shared::domain::{TableName, UploadFile};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  query <text>                  type <text> and submit it
  type <text>                   replace the query input
  submit                        submit the query input
  random                        suggest a random question
  upload <path>                 upload a .csv, .json or .jsonl file
  sample <users|products|events>
  drag <zone> <enter|over|leave>
  drop <zone> <path>            zones: query, tables
  generate <table>              add synthetic rows
  remove <table>
  export-table <table>
  export-results
  toggle                        show or hide the results
  schema                        reload the table list
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Query(String),
    Type(String),
    Submit,
    Random,
    Upload(PathBuf),
    Sample(String),
    Drag { zone: ZoneId, kind: DragEventKind },
    Drop { zone: ZoneId, path: PathBuf },
    Generate(TableName),
    Remove(TableName),
    ExportTable(TableName),
    ExportResults,
    Toggle,
    Schema,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("drag events are enter, over or leave, not '{0}'")]
    InvalidDragKind(String),
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));

    let command = match word {
        "query" => ConsoleCommand::Query(required("query", rest)?.to_string()),
        "type" => ConsoleCommand::Type(rest.to_string()),
        "submit" => ConsoleCommand::Submit,
        "random" => ConsoleCommand::Random,
        "upload" => ConsoleCommand::Upload(PathBuf::from(required("upload", rest)?)),
        "sample" => ConsoleCommand::Sample(required("sample", rest)?.to_string()),
        "drag" => {
            let (zone, kind) = required("drag", rest)?
                .split_once(char::is_whitespace)
                .ok_or(CommandError::MissingArgument("drag"))?;
            ConsoleCommand::Drag {
                zone: zone_named(zone),
                kind: drag_kind(kind.trim())?,
            }
        }
        "drop" => {
            let (zone, path) = required("drop", rest)?
                .split_once(char::is_whitespace)
                .ok_or(CommandError::MissingArgument("drop"))?;
            ConsoleCommand::Drop {
                zone: zone_named(zone),
                path: PathBuf::from(path.trim()),
            }
        }
        "generate" => ConsoleCommand::Generate(TableName::new(required("generate", rest)?)),
        "remove" => ConsoleCommand::Remove(TableName::new(required("remove", rest)?)),
        "export-table" => {
            ConsoleCommand::ExportTable(TableName::new(required("export-table", rest)?))
        }
        "export-results" => ConsoleCommand::ExportResults,
        "toggle" => ConsoleCommand::Toggle,
        "schema" => ConsoleCommand::Schema,
        "help" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required<'a>(command: &'static str, rest: &'a str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument(command))
    } else {
        Ok(rest)
    }
}

/// `query` and `tables` are shorthands for the two built-in zones.
fn zone_named(name: &str) -> ZoneId {
    match name {
        "query" => ZoneId::query_section(),
        "tables" => ZoneId::tables_section(),
        other => ZoneId::new(other),
    }
}

fn drag_kind(kind: &str) -> Result<DragEventKind, CommandError> {
    match kind {
        "enter" => Ok(DragEventKind::Enter),
        "over" => Ok(DragEventKind::Over),
        "leave" => Ok(DragEventKind::Leave),
        other => Err(CommandError::InvalidDragKind(other.to_string())),
    }
}

/// Reads a local file into an upload, guessing its content type from the
/// extension.
pub async fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("'{}' is not a file", path.display()))?;

    let file = UploadFile::new(file_name, bytes);
    Ok(match mime_guess::from_path(path).first() {
        Some(mime) => file.with_content_type(mime.essence_str()),
        None => file,
    })
}
